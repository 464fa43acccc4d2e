//! Health statistics for the exporter.
//!
//! Tracks collection cycle outcomes and durations plus HTTP request counts,
//! and renders them as the plain-text table served on `/health`.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::Instant;

use crate::collectors::diskstats::DiskstatsError;

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns (last, avg, max, min, count).
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Outcome of the most recent collection cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleStatus {
    NotRun,
    Ok,
    Failed(String),
}

/// Health statistics for the exporter.
pub struct HealthStats {
    pub cycle_duration_seconds: Stat,
    pub exported_devices: Stat,
    pub total_cycles: AtomicU64,
    pub cycle_failures: AtomicU64,
    pub format_errors: AtomicU64,
    pub io_errors: AtomicU64,
    pub other_errors: AtomicU64,
    pub http_requests: AtomicU64,
    pub start_time: Instant,
    last_status: StdRwLock<CycleStatus>,
    last_cycle_time: StdRwLock<Option<Instant>>,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            cycle_duration_seconds: Stat::default(),
            exported_devices: Stat::default(),
            total_cycles: AtomicU64::new(0),
            cycle_failures: AtomicU64::new(0),
            format_errors: AtomicU64::new(0),
            io_errors: AtomicU64::new(0),
            other_errors: AtomicU64::new(0),
            http_requests: AtomicU64::new(0),
            start_time: Instant::now(),
            last_status: StdRwLock::new(CycleStatus::NotRun),
            last_cycle_time: StdRwLock::new(None),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_cycle_success(&self, duration_seconds: f64, exported_devices: usize) {
        self.cycle_duration_seconds.add_sample(duration_seconds);
        self.exported_devices.add_sample(exported_devices as f64);
        self.total_cycles.fetch_add(1, Ordering::Relaxed);
        self.set_status(CycleStatus::Ok);
    }

    /// Records a failed cycle, counted as a format, read or other error.
    pub fn record_cycle_failure(&self, duration_seconds: f64, error: &DiskstatsError) {
        self.cycle_duration_seconds.add_sample(duration_seconds);
        self.total_cycles.fetch_add(1, Ordering::Relaxed);
        self.cycle_failures.fetch_add(1, Ordering::Relaxed);
        let counter = match error {
            e if e.is_format_error() => &self.format_errors,
            DiskstatsError::Io { .. } => &self.io_errors,
            _ => &self.other_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.set_status(CycleStatus::Failed(error.to_string()));
    }

    pub fn record_http_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn set_status(&self, status: CycleStatus) {
        if let Ok(mut guard) = self.last_status.write() {
            *guard = status;
        }
        if let Ok(mut guard) = self.last_cycle_time.write() {
            *guard = Some(Instant::now());
        }
    }

    pub fn last_status(&self) -> CycleStatus {
        self.last_status
            .read()
            .map(|s| s.clone())
            .unwrap_or(CycleStatus::NotRun)
    }

    /// Healthy until a cycle has failed, and again after the next success.
    pub fn is_healthy(&self) -> bool {
        !matches!(self.last_status(), CycleStatus::Failed(_))
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Renders the statistics as a plain-text table.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        writeln!(out, "COLLECTION CYCLES").ok();
        writeln!(out, "=================").ok();
        writeln!(out).ok();
        writeln!(
            out,
            "{:30} | {:>10} | {:>10} | {:>10} | {:>10}",
            "Metric", "Last", "Avg", "Max", "Min"
        )
        .ok();
        writeln!(out, "{}", "-".repeat(82)).ok();

        for (name, stat) in [
            ("cycle_duration_seconds", &self.cycle_duration_seconds),
            ("exported_devices", &self.exported_devices),
        ] {
            let (last, avg, max, min, _) = stat.snapshot();
            writeln!(
                out,
                "{:30} | {:>10.4} | {:>10.4} | {:>10.4} | {:>10.4}",
                name, last, avg, max, min
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(
            out,
            "Total cycles:     {}",
            self.total_cycles.load(Ordering::Relaxed)
        )
        .ok();
        writeln!(
            out,
            "Failed cycles:    {}",
            self.cycle_failures.load(Ordering::Relaxed)
        )
        .ok();
        writeln!(
            out,
            "  format errors:  {}",
            self.format_errors.load(Ordering::Relaxed)
        )
        .ok();
        writeln!(
            out,
            "  read errors:    {}",
            self.io_errors.load(Ordering::Relaxed)
        )
        .ok();
        writeln!(
            out,
            "  other errors:   {}",
            self.other_errors.load(Ordering::Relaxed)
        )
        .ok();
        writeln!(
            out,
            "HTTP requests:    {}",
            self.http_requests.load(Ordering::Relaxed)
        )
        .ok();

        let since_last = self
            .last_cycle_time
            .read()
            .ok()
            .and_then(|t| t.map(|i| i.elapsed().as_secs_f64()));
        match since_last {
            Some(secs) => writeln!(out, "Last cycle:       {:.1}s ago", secs).ok(),
            None => writeln!(out, "Last cycle:       never").ok(),
        };

        match self.last_status() {
            CycleStatus::NotRun => writeln!(out, "Last status:      not run").ok(),
            CycleStatus::Ok => writeln!(out, "Last status:      ok").ok(),
            CycleStatus::Failed(e) => writeln!(out, "Last status:      failed ({e})").ok(),
        };

        out
    }
}
