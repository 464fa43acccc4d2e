//! Prometheus metrics definitions for herakles-diskstats-exporter.
//!
//! `DiskMetrics` turns the diskstats field table into registered
//! `CounterVec`/`GaugeVec` families and acts as a sink for collection
//! cycles. `ExporterMetrics` holds the exporter's own telemetry.

use ahash::AHashMap as HashMap;
use prometheus::{CounterVec, Gauge, GaugeVec, Opts, Registry};

use crate::collectors::diskstats::FieldSpec;
use crate::collectors::sink::{MetricKind, MetricSink, Sample, SinkError, DEVICE_LABEL};

#[derive(Clone)]
enum Family {
    Counter(CounterVec),
    Gauge(GaugeVec),
}

/// Registry-backed disk metrics, one family per field table entry.
///
/// Clones share the underlying metric families.
#[derive(Clone)]
pub struct DiskMetrics {
    families: HashMap<&'static str, Family>,
}

impl DiskMetrics {
    /// Creates and registers one metric family per entry of `fields`.
    pub fn new(registry: &Registry, fields: &[FieldSpec]) -> prometheus::Result<Self> {
        let mut families = HashMap::with_capacity(fields.len());

        for entry in fields {
            let desc = &entry.descriptor;
            let opts = Opts::new(desc.name, desc.help);
            let family = match desc.kind {
                MetricKind::Counter => {
                    let vec = CounterVec::new(opts, &[DEVICE_LABEL])?;
                    registry.register(Box::new(vec.clone()))?;
                    Family::Counter(vec)
                }
                MetricKind::Gauge => {
                    let vec = GaugeVec::new(opts, &[DEVICE_LABEL])?;
                    registry.register(Box::new(vec.clone()))?;
                    Family::Gauge(vec)
                }
            };
            families.insert(desc.name, family);
        }

        Ok(Self { families })
    }

    /// Drops all device series so devices that disappeared are not exported
    /// with stale values.
    pub fn reset(&self) {
        for family in self.families.values() {
            match family {
                Family::Counter(vec) => vec.reset(),
                Family::Gauge(vec) => vec.reset(),
            }
        }
    }
}

impl MetricSink for DiskMetrics {
    fn emit(&mut self, sample: Sample) -> Result<(), SinkError> {
        let family = self
            .families
            .get(sample.name())
            .ok_or_else(|| SinkError(format!("unknown metric {}", sample.name())))?;

        match family {
            Family::Counter(vec) => {
                // Counters carry cumulative kernel values, use reset + inc_by
                if sample.value < 0.0 || sample.value.is_nan() {
                    return Err(SinkError(format!(
                        "invalid value {} for counter {} on {}",
                        sample.value,
                        sample.name(),
                        sample.device
                    )));
                }
                let counter = vec
                    .get_metric_with_label_values(&[sample.device.as_str()])
                    .map_err(|e| SinkError(e.to_string()))?;
                counter.reset();
                counter.inc_by(sample.value);
            }
            Family::Gauge(vec) => {
                vec.get_metric_with_label_values(&[sample.device.as_str()])
                    .map_err(|e| SinkError(e.to_string()))?
                    .set(sample.value);
            }
        }
        Ok(())
    }
}

/// Internal exporter telemetry.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub scrape_duration: Gauge,
    pub collector_duration: GaugeVec,
    pub collector_success: GaugeVec,
}

impl ExporterMetrics {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let scrape_duration = Gauge::new(
            "herakles_exporter_scrape_duration_seconds",
            "Time spent serving /metrics request",
        )?;
        let collector_duration = GaugeVec::new(
            Opts::new(
                "herakles_exporter_collector_duration_seconds",
                "Time spent in the last collection cycle of a collector",
            ),
            &["collector"],
        )?;
        let collector_success = GaugeVec::new(
            Opts::new(
                "herakles_exporter_collector_success",
                "Whether the last collection cycle succeeded (1) or failed (0)",
            ),
            &["collector"],
        )?;

        registry.register(Box::new(scrape_duration.clone()))?;
        registry.register(Box::new(collector_duration.clone()))?;
        registry.register(Box::new(collector_success.clone()))?;

        Ok(Self {
            scrape_duration,
            collector_duration,
            collector_success,
        })
    }

    pub fn record_cycle(&self, collector: &str, duration_seconds: f64, success: bool) {
        self.collector_duration
            .with_label_values(&[collector])
            .set(duration_seconds);
        self.collector_success
            .with_label_values(&[collector])
            .set(if success { 1.0 } else { 0.0 });
    }
}
