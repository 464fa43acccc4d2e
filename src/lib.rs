//! Herakles Diskstats Exporter Library
//!
//! This library reads block device I/O counters from `/proc/diskstats` and
//! turns them into Prometheus metrics. The collector is framework-agnostic:
//! each collection cycle pushes samples into a [`MetricSink`], which can be a
//! `Vec`, a bounded channel or the registry-backed [`DiskMetrics`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use herakles_diskstats_exporter::{DeviceFilter, DiskstatsCollector, Sample};
//!
//! let collector = DiskstatsCollector::new("/proc", DeviceFilter::default());
//!
//! let mut samples: Vec<Sample> = Vec::new();
//! match collector.update(&mut samples) {
//!     Ok(summary) => println!("{} devices exported", summary.devices_exported),
//!     Err(e) => eprintln!("cycle failed after {} samples: {}", samples.len(), e),
//! }
//!
//! for sample in &samples {
//!     println!("{}{{device=\"{}\"}} {}", sample.name(), sample.device, sample.value);
//! }
//! ```

pub mod collectors;
pub mod health_stats;
pub mod metrics;

// Re-export main types for convenience
pub use collectors::diskstats::{
    CycleSummary, DeviceFilter, DiskstatsCollector, DiskstatsError, DEFAULT_IGNORED_DEVICES,
    DEFAULT_PROCFS_PATH, DISKSTATS_FIELDS,
};
pub use collectors::sink::{MetricDescriptor, MetricKind, MetricSink, Sample, SinkError};
pub use health_stats::{CycleStatus, HealthStats};
pub use metrics::{DiskMetrics, ExporterMetrics};
