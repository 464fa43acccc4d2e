//! Disk I/O statistics collector.
//!
//! Reads per-device counters from `<procfs>/diskstats` and emits 13 samples
//! per block device: the 11 kernel counters (time fields in seconds) plus
//! bytes read and written derived from the sector counters.
//!
//! - `parser`: file reading, line tokenizing and sector to byte conversion
//! - `filter`: device name exclusion
//! - `descriptors`: field table and mapping to samples
//! - `error`: cycle errors

pub mod descriptors;
pub mod error;
pub mod filter;
pub mod parser;

pub use descriptors::{map_device, Conversion, FieldSpec, DISKSTATS_FIELDS};
pub use error::DiskstatsError;
pub use filter::{DeviceFilter, DEFAULT_IGNORED_DEVICES};
pub use parser::{
    convert_disk_sectors_to_bytes, parse_diskstats, read_diskstats, DeviceStats,
    ParsedDeviceStats, DISK_SECTOR_SIZE,
};

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::collectors::sink::{MetricDescriptor, MetricSink};

/// Default mount point of procfs.
pub const DEFAULT_PROCFS_PATH: &str = "/proc";

/// Outcome of a successful collection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub devices_exported: usize,
    pub devices_ignored: usize,
    pub samples_emitted: usize,
}

/// Collector for `/proc/diskstats`.
///
/// Holds only immutable state, so one instance can be shared between
/// cycles. Callers serialize cycles themselves.
#[derive(Debug, Clone)]
pub struct DiskstatsCollector {
    procfs_path: PathBuf,
    filter: DeviceFilter,
    fields: &'static [FieldSpec],
}

impl DiskstatsCollector {
    pub fn new(procfs_path: impl Into<PathBuf>, filter: DeviceFilter) -> Self {
        Self {
            procfs_path: procfs_path.into(),
            filter,
            fields: &DISKSTATS_FIELDS,
        }
    }

    /// Builds a collector from a raw ignored-devices pattern.
    pub fn with_pattern(
        procfs_path: impl Into<PathBuf>,
        ignored_devices: &str,
    ) -> Result<Self, DiskstatsError> {
        Ok(Self::new(procfs_path, DeviceFilter::new(ignored_devices)?))
    }

    /// Path of the stats source, `<procfs>/diskstats`.
    pub fn source_path(&self) -> PathBuf {
        self.procfs_path.join("diskstats")
    }

    pub fn procfs_path(&self) -> &Path {
        &self.procfs_path
    }

    pub fn filter(&self) -> &DeviceFilter {
        &self.filter
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static MetricDescriptor> {
        self.fields.iter().map(|entry| &entry.descriptor)
    }

    /// Runs one collection cycle into `sink`.
    ///
    /// Stops at the first error. Samples for devices handled before the
    /// failing one have already been emitted and stay in the sink.
    pub fn update(&self, sink: &mut dyn MetricSink) -> Result<CycleSummary, DiskstatsError> {
        let path = self.source_path();
        let stats = read_diskstats(&path)?;
        trace!("Parsed {} devices from {}", stats.len(), path.display());

        let mut summary = CycleSummary::default();
        for dev in stats.iter() {
            if self.filter.is_ignored(&dev.device) {
                debug!("Ignoring device: {}", dev.device);
                summary.devices_ignored += 1;
                continue;
            }

            summary.samples_emitted +=
                map_device(self.fields, &dev.device, &dev.fields, &path, sink)?;
            summary.devices_exported += 1;
        }

        Ok(summary)
    }
}

impl Default for DiskstatsCollector {
    fn default() -> Self {
        Self::new(DEFAULT_PROCFS_PATH, DeviceFilter::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::sink::Sample;
    use std::fs;

    fn collector_with(content: &str) -> (tempfile::TempDir, DiskstatsCollector) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("diskstats"), content).unwrap();
        let collector = DiskstatsCollector::new(dir.path(), DeviceFilter::default());
        (dir, collector)
    }

    #[test]
    fn test_update_skips_ignored_devices() {
        let (_dir, collector) = collector_with(
            "\
   7       0 loop0 1 0 2 0 0 0 0 0 0 0 0
   8       0 sda 100 5 2000 100 50 5 1000 50 2 300 400
   8       1 sda1 10 0 200 10 5 0 100 5 0 30 40
",
        );
        let mut samples: Vec<Sample> = Vec::new();
        let summary = collector.update(&mut samples).unwrap();

        assert_eq!(summary.devices_exported, 1);
        assert_eq!(summary.devices_ignored, 2);
        assert_eq!(summary.samples_emitted, 13);
        assert!(samples.iter().all(|s| s.device == "sda"));
    }

    #[test]
    fn test_ignored_device_with_wrong_field_count_is_not_an_error() {
        let (_dir, collector) = collector_with("   7       0 loop0 1 0 2 0 0 0 3 0 0 0 0 0 0 0 0\n");
        let mut samples: Vec<Sample> = Vec::new();
        let summary = collector.update(&mut samples).unwrap();

        assert_eq!(summary.devices_ignored, 1);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_descriptors_match_table() {
        let collector = DiskstatsCollector::default();
        assert_eq!(collector.descriptors().count(), 13);
        assert_eq!(collector.source_path(), PathBuf::from("/proc/diskstats"));
        assert_eq!(collector.filter().pattern(), DEFAULT_IGNORED_DEVICES);
    }

    #[test]
    fn test_with_pattern_rejects_invalid_regex() {
        let err = DiskstatsCollector::with_pattern("/proc", "[").unwrap_err();
        assert!(matches!(err, DiskstatsError::InvalidPattern(_)));
    }
}
