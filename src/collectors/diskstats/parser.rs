//! Reading and parsing of `/proc/diskstats`.
//!
//! Format: `major minor name f0 f1 ... f10`, fields separated by runs of
//! whitespace. Docs: https://www.kernel.org/doc/Documentation/iostats.txt
//!
//! Field indices below are relative to the fourth token:
//! 0 reads completed, 1 reads merged, 2 sectors read, 3 ms reading,
//! 4 writes completed, 5 writes merged, 6 sectors written, 7 ms writing,
//! 8 I/Os in progress, 9 ms doing I/O, 10 weighted ms doing I/O.
//! Parsing appends bytes read (11) and bytes written (12).

use ahash::AHashMap as HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::error::DiskstatsError;

/// Sector size the kernel uses for the sector counters, independent of the
/// device's physical sector size.
pub const DISK_SECTOR_SIZE: u64 = 512;

/// Raw index of the sectors read counter.
pub const SECTORS_READ_INDEX: usize = 2;

/// Raw index of the sectors written counter.
pub const SECTORS_WRITTEN_INDEX: usize = 6;

/// Tokens preceding the stat fields: major, minor and device name.
const PREFIX_TOKENS: usize = 3;

/// Stat fields of one device, raw values followed by the derived byte counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStats {
    pub device: String,
    pub fields: Vec<String>,
}

/// Parsed content of one diskstats read.
///
/// Devices keep the order of their first appearance. A repeated device name
/// replaces the earlier fields in place.
#[derive(Debug, Default)]
pub struct ParsedDeviceStats {
    devices: Vec<DeviceStats>,
    index: HashMap<String, usize>,
}

impl ParsedDeviceStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a device, overwriting any earlier entry with the same name.
    pub fn insert(&mut self, stats: DeviceStats) {
        match self.index.get(&stats.device) {
            Some(&pos) => self.devices[pos] = stats,
            None => {
                self.index.insert(stats.device.clone(), self.devices.len());
                self.devices.push(stats);
            }
        }
    }

    pub fn get(&self, device: &str) -> Option<&[String]> {
        self.index
            .get(device)
            .map(|&pos| self.devices[pos].fields.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceStats> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Opens `path` and parses it. The file is closed before returning, on
/// success and on every error.
pub fn read_diskstats(path: &Path) -> Result<ParsedDeviceStats, DiskstatsError> {
    let file = File::open(path).map_err(|source| DiskstatsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_diskstats(BufReader::new(file), path)
}

/// Parses diskstats content line by line. `path` is only used for error
/// context.
pub fn parse_diskstats<R: BufRead>(
    mut reader: R,
    path: &Path,
) -> Result<ParsedDeviceStats, DiskstatsError> {
    let mut stats = ParsedDeviceStats::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| DiskstatsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        // Undecodable content is a malformed line, not a read failure.
        let line = std::str::from_utf8(&buf).map_err(|_| DiskstatsError::InvalidLine {
            path: path.to_path_buf(),
            line: String::from_utf8_lossy(&buf).into_owned(),
        })?;

        let mut parsed = parse_line(line, path)?;
        append_sector_bytes(&mut parsed.fields, line, path)?;
        stats.insert(parsed);
    }

    Ok(stats)
}

/// Splits one line into device name and raw fields.
///
/// Major and minor numbers are dropped. At least one stat field is required.
pub fn parse_line(line: &str, path: &Path) -> Result<DeviceStats, DiskstatsError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() <= PREFIX_TOKENS {
        return Err(DiskstatsError::InvalidLine {
            path: path.to_path_buf(),
            line: line.to_string(),
        });
    }

    Ok(DeviceStats {
        device: parts[2].to_string(),
        fields: parts[PREFIX_TOKENS..].iter().map(|s| s.to_string()).collect(),
    })
}

/// Converts a sector count to bytes. `None` unless the input is plain ASCII
/// digits and the result fits in a u64.
pub fn convert_disk_sectors_to_bytes(sector_count: &str) -> Option<u64> {
    // u64::from_str also takes a leading '+'.
    if sector_count.is_empty() || !sector_count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sectors: u64 = sector_count.parse().ok()?;
    sectors.checked_mul(DISK_SECTOR_SIZE)
}

/// Appends bytes read and bytes written to the raw fields.
///
/// Both sector fields are validated before anything is appended.
pub fn append_sector_bytes(
    fields: &mut Vec<String>,
    line: &str,
    path: &Path,
) -> Result<(), DiskstatsError> {
    let sector_bytes = |index: usize, field: &'static str| {
        fields
            .get(index)
            .and_then(|v| convert_disk_sectors_to_bytes(v))
            .ok_or_else(|| DiskstatsError::InvalidSectors {
                path: path.to_path_buf(),
                field,
                line: line.to_string(),
            })
    };

    let bytes_read = sector_bytes(SECTORS_READ_INDEX, "read")?;
    let bytes_written = sector_bytes(SECTORS_WRITTEN_INDEX, "written")?;

    fields.push(bytes_read.to_string());
    fields.push(bytes_written.to_string());
    Ok(())
}
