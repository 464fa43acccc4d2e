//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use herakles_diskstats_exporter::{DiskMetrics, DiskstatsCollector, ExporterMetrics, HealthStats};
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub registry: Registry,
    /// Registry-backed sink. The owned guard travels with each cycle, so
    /// cycles stay serialized even if the scrape request goes away.
    pub disk_metrics: Arc<Mutex<DiskMetrics>>,
    pub telemetry: Option<ExporterMetrics>,
    pub collector: Arc<DiskstatsCollector>,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
