//! Errors raised by a diskstats collection cycle.

use std::io;
use std::path::PathBuf;

use crate::collectors::sink::SinkError;

/// Failure of a single collection cycle.
///
/// Every variant is fatal to the cycle. Samples emitted before the error
/// are not retracted.
#[derive(Debug, thiserror::Error)]
pub enum DiskstatsError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid line in {}: {line}", .path.display())]
    InvalidLine { path: PathBuf, line: String },

    #[error("invalid value for sectors {field} in {}: {line}", .path.display())]
    InvalidSectors {
        path: PathBuf,
        field: &'static str,
        line: String,
    },

    #[error("invalid value {value} in {} for {device}", .path.display())]
    InvalidValue {
        path: PathBuf,
        device: String,
        value: String,
    },

    #[error(
        "invalid line for {} for {device}: expected {expected} fields, got {actual}",
        .path.display()
    )]
    FieldCount {
        path: PathBuf,
        device: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid ignored devices pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl DiskstatsError {
    /// True for errors caused by unexpected content in the stats source.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DiskstatsError::InvalidLine { .. }
                | DiskstatsError::InvalidSectors { .. }
                | DiskstatsError::InvalidValue { .. }
                | DiskstatsError::FieldCount { .. }
        )
    }
}
