//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! collection cycle statistics as plain text.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use herakles_diskstats_exporter::CycleStatus;
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "Project: https://github.com/cansp-dev/herakles-diskstats-exporter — More info: https://www.herakles.now — Support: exporter@herakles.now";

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");
    state.health_stats.record_http_request();

    let status = if state.health_stats.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let message = match state.health_stats.last_status() {
        CycleStatus::NotRun => "OK - No collection cycle yet",
        CycleStatus::Ok => "OK",
        CycleStatus::Failed(_) => "Last diskstats collection failed",
    };

    let uptime_str = format_uptime(state.health_stats.get_uptime_seconds());
    let table = state.health_stats.render_table();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!(
            "{message}\n\nUptime: {uptime_str}\nSource: {}\nIgnored devices: {}\n\n{table}\n{FOOTER_TEXT}",
            state.collector.source_path().display(),
            state.collector.filter().pattern(),
        ),
    )
}

fn format_uptime(uptime_seconds: u64) -> String {
    let uptime_hours = uptime_seconds as f64 / SECONDS_PER_HOUR;
    if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    }
}
