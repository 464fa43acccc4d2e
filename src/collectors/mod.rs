//! Collectors module for system metrics.
//!
//! - `diskstats`: block device I/O statistics from /proc/diskstats
//! - `sink`: samples and the consumers a collection cycle emits into

pub mod diskstats;
pub mod sink;

pub use diskstats::{CycleSummary, DiskstatsCollector, DiskstatsError};
pub use sink::{MetricDescriptor, MetricKind, MetricSink, Sample, SinkError, DEVICE_LABEL};
