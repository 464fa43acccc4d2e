//! Metrics endpoint handler for Prometheus scraping.
//!
//! Every request runs one diskstats collection cycle into the registry and
//! returns the encoded registry. A failed cycle still exposes the samples
//! emitted before the failure; the failure shows up in
//! `herakles_exporter_collector_success` and on `/health`.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, instrument, warn};

use crate::state::SharedState;
use herakles_diskstats_exporter::{CycleSummary, DiskMetrics, DiskstatsCollector, DiskstatsError};

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 64 * 1024;

/// Collector label used in exporter telemetry.
const DISKSTATS_COLLECTOR: &str = "diskstats";

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
    CollectorPanicked,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        let message = match self {
            MetricsError::EncodingFailed => "Failed to encode metrics",
            MetricsError::CollectorPanicked => "Collector task failed",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

/// Runs one cycle on a blocking thread.
///
/// The blocking task owns the sink guard until the cycle ends and hands it
/// back for encoding. A dropped request future therefore never releases the
/// lock while the cycle is still writing.
async fn run_cycle(
    collector: Arc<DiskstatsCollector>,
    sink: Arc<Mutex<DiskMetrics>>,
) -> Result<(Result<CycleSummary, DiskstatsError>, OwnedMutexGuard<DiskMetrics>), MetricsError> {
    let mut guard = sink.lock_owned().await;
    tokio::task::spawn_blocking(move || {
        guard.reset();
        let result = collector.update(&mut *guard);
        (result, guard)
    })
    .await
    .map_err(|e| {
        error!("Diskstats collection task failed: {}", e);
        MetricsError::CollectorPanicked
    })
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");
    state.health_stats.record_http_request();

    let cycle_start = Instant::now();
    // Held until encoding is done so concurrent scrapes never interleave cycles.
    let (result, guard) = run_cycle(state.collector.clone(), state.disk_metrics.clone()).await?;
    let cycle_seconds = cycle_start.elapsed().as_secs_f64();

    let success = match &result {
        Ok(summary) => {
            debug!(
                "Diskstats cycle: {} devices exported, {} ignored, {} samples",
                summary.devices_exported, summary.devices_ignored, summary.samples_emitted
            );
            state
                .health_stats
                .record_cycle_success(cycle_seconds, summary.devices_exported);
            true
        }
        Err(e) => {
            warn!("Diskstats collection failed: {}", e);
            state
                .health_stats
                .record_cycle_failure(cycle_seconds, e);
            false
        }
    };

    if let Some(telemetry) = &state.telemetry {
        telemetry.record_cycle(DISKSTATS_COLLECTOR, cycle_seconds, success);
        telemetry
            .scrape_duration
            .set(start.elapsed().as_secs_f64());
    }

    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    let encoder = TextEncoder::new();
    encoder
        .encode(&state.registry.gather(), &mut buffer)
        .map_err(|e| {
            error!("Failed to encode metrics: {}", e);
            MetricsError::EncodingFailed
        })?;
    drop(guard);

    String::from_utf8(buffer).map_err(|e| {
        error!("Metrics output is not valid UTF-8: {}", e);
        MetricsError::EncodingFailed
    })
}
