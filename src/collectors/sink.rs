//! Metric samples and the sinks that consume them.
//!
//! A collection cycle pushes samples into a [`MetricSink`] one at a time as
//! each device is mapped. Samples already handed to the sink stay there even
//! if a later device fails the cycle.

use std::sync::mpsc::SyncSender;

/// Prometheus metric type of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Immutable description of one exported metric.
///
/// Every descriptor carries exactly one label, [`DEVICE_LABEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
}

/// Label name attached to every disk sample.
pub const DEVICE_LABEL: &str = "device";

/// One emitted value for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub descriptor: &'static MetricDescriptor,
    pub device: String,
    pub value: f64,
}

impl Sample {
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn kind(&self) -> MetricKind {
        self.descriptor.kind
    }
}

/// Error returned when a sink cannot accept a sample.
#[derive(Debug, thiserror::Error)]
#[error("metric sink rejected sample: {0}")]
pub struct SinkError(pub String);

/// Consumer side of a collection cycle.
pub trait MetricSink {
    fn emit(&mut self, sample: Sample) -> Result<(), SinkError>;
}

impl MetricSink for Vec<Sample> {
    fn emit(&mut self, sample: Sample) -> Result<(), SinkError> {
        self.push(sample);
        Ok(())
    }
}

/// Bounded channel sink. Blocks while the receiver is behind.
impl MetricSink for SyncSender<Sample> {
    fn emit(&mut self, sample: Sample) -> Result<(), SinkError> {
        self.send(sample)
            .map_err(|e| SinkError(format!("receiver dropped, lost {} for {}", e.0.name(), e.0.device)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    static TEST_DESC: MetricDescriptor = MetricDescriptor {
        name: "test_metric_total",
        help: "Test metric.",
        kind: MetricKind::Counter,
    };

    fn sample(value: f64) -> Sample {
        Sample {
            descriptor: &TEST_DESC,
            device: "sda".to_string(),
            value,
        }
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<Sample> = Vec::new();
        sink.emit(sample(1.0)).unwrap();
        sink.emit(sample(2.0)).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].value, 1.0);
        assert_eq!(sink[1].value, 2.0);
        assert_eq!(sink[0].name(), "test_metric_total");
        assert_eq!(sink[0].kind().as_str(), "counter");
    }

    #[test]
    fn test_channel_sink_fails_after_receiver_dropped() {
        let (mut tx, rx) = mpsc::sync_channel::<Sample>(4);
        tx.emit(sample(1.0)).unwrap();
        assert_eq!(rx.recv().unwrap().value, 1.0);

        drop(rx);
        let err = tx.emit(sample(2.0)).unwrap_err();
        assert!(err.to_string().contains("receiver dropped"));
    }
}
