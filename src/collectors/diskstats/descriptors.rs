//! Field table binding diskstats positions to metric descriptors.
//!
//! Docs from https://www.kernel.org/doc/Documentation/iostats.txt

use std::path::Path;

use super::error::DiskstatsError;
use crate::collectors::sink::{MetricDescriptor, MetricKind, MetricSink, Sample};

use Conversion::{Identity as Raw, MillisToSeconds};
use MetricKind::{Counter, Gauge};

/// Unit conversion applied to a raw field before emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Identity,
    MillisToSeconds,
}

impl Conversion {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Conversion::Identity => value,
            Conversion::MillisToSeconds => value / 1000.0,
        }
    }
}

/// One entry of the field table.
#[derive(Debug)]
pub struct FieldSpec {
    pub index: usize,
    pub descriptor: MetricDescriptor,
    pub conversion: Conversion,
}

const fn field(
    index: usize,
    name: &'static str,
    help: &'static str,
    kind: MetricKind,
    conversion: Conversion,
) -> FieldSpec {
    FieldSpec {
        index,
        descriptor: MetricDescriptor { name, help, kind },
        conversion,
    }
}

/// Positional layout of the 11 kernel fields plus the two derived byte
/// counters. Entry `i` has `index == i`.
pub static DISKSTATS_FIELDS: [FieldSpec; 13] = [
    field(
        0,
        "herakles_disk_reads_completed_total",
        "The total number of reads completed successfully.",
        Counter,
        Raw,
    ),
    field(
        1,
        "herakles_disk_reads_merged_total",
        "The total number of reads merged. See https://www.kernel.org/doc/Documentation/iostats.txt.",
        Counter,
        Raw,
    ),
    field(
        2,
        "herakles_disk_read_sectors_total",
        "The total number of sectors read successfully.",
        Counter,
        Raw,
    ),
    field(
        3,
        "herakles_disk_read_time_seconds_total",
        "The total number of seconds spent by all reads.",
        Counter,
        MillisToSeconds,
    ),
    field(
        4,
        "herakles_disk_writes_completed_total",
        "The total number of writes completed successfully.",
        Counter,
        Raw,
    ),
    field(
        5,
        "herakles_disk_writes_merged_total",
        "The number of writes merged. See https://www.kernel.org/doc/Documentation/iostats.txt.",
        Counter,
        Raw,
    ),
    field(
        6,
        "herakles_disk_written_sectors_total",
        "The total number of sectors written successfully.",
        Counter,
        Raw,
    ),
    field(
        7,
        "herakles_disk_write_time_seconds_total",
        "This is the total number of seconds spent by all writes.",
        Counter,
        MillisToSeconds,
    ),
    field(
        8,
        "herakles_disk_io_now",
        "The number of I/Os currently in progress.",
        Gauge,
        Raw,
    ),
    field(
        9,
        "herakles_disk_io_time_seconds_total",
        "Total seconds spent doing I/Os.",
        Counter,
        MillisToSeconds,
    ),
    field(
        10,
        "herakles_disk_io_time_weighted_seconds_total",
        "The weighted # of seconds spent doing I/Os. See https://www.kernel.org/doc/Documentation/iostats.txt.",
        Counter,
        MillisToSeconds,
    ),
    field(
        11,
        "herakles_disk_read_bytes_total",
        "The total number of bytes read successfully.",
        Counter,
        Raw,
    ),
    field(
        12,
        "herakles_disk_written_bytes_total",
        "The total number of bytes written successfully.",
        Counter,
        Raw,
    ),
];

/// Maps the fields of one device onto `table` and emits one sample per entry.
///
/// The field count must match the table length exactly. Samples are emitted
/// as each field is converted, so a bad value halfway leaves the earlier
/// samples in the sink.
pub fn map_device(
    table: &'static [FieldSpec],
    device: &str,
    fields: &[String],
    path: &Path,
    sink: &mut dyn MetricSink,
) -> Result<usize, DiskstatsError> {
    if fields.len() != table.len() {
        return Err(DiskstatsError::FieldCount {
            path: path.to_path_buf(),
            device: device.to_string(),
            expected: table.len(),
            actual: fields.len(),
        });
    }

    for entry in table {
        let raw = &fields[entry.index];
        let value: f64 = raw.parse().map_err(|_| DiskstatsError::InvalidValue {
            path: path.to_path_buf(),
            device: device.to_string(),
            value: raw.clone(),
        })?;

        sink.emit(Sample {
            descriptor: &entry.descriptor,
            device: device.to_string(),
            value: entry.conversion.apply(value),
        })?;
    }

    Ok(table.len())
}
