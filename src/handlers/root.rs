//! Root endpoint handler for the landing page.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use std::fmt::Write;
use std::path::Path;
use tracing::{debug, instrument};

use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();

    Html(render_landing_page(
        &state.collector.source_path(),
        state.collector.filter().pattern(),
        state.config.enable_health.unwrap_or(true),
        state.start_time.elapsed().as_secs(),
    ))
}

fn render_landing_page(source: &Path, ignored: &str, health: bool, uptime_secs: u64) -> String {
    let mut endpoints = String::from(
        "<li><a href=\"/metrics\">/metrics</a> - per-device I/O counters in Prometheus text format</li>\n",
    );
    if health {
        endpoints.push_str(
            "<li><a href=\"/health\">/health</a> - outcome of the last collection cycle</li>\n",
        );
    }

    let mut html = String::new();
    write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"UTF-8\"><title>Herakles Diskstats Exporter</title></head>\n<body>\n\
         <h1>Herakles Diskstats Exporter {version}</h1>\n\
         <p>Source: <code>{source}</code><br>Ignored devices: <code>{ignored}</code><br>Uptime: {h}h {m}m {s}s</p>\n\
         <ul>\n{endpoints}</ul>\n\
         <p><small>{footer}</small></p>\n</body>\n</html>\n",
        version = env!("CARGO_PKG_VERSION"),
        source = escape(&source.display().to_string()),
        ignored = escape(ignored),
        h = uptime_secs / 3600,
        m = (uptime_secs % 3600) / 60,
        s = uptime_secs % 60,
        footer = FOOTER_TEXT,
    )
    .ok();
    html
}

/// Minimal HTML escaping for values that end up inside `<code>`.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
