//! herakles-diskstats-exporter - version 0.1.0
//!
//! Block device I/O statistics exporter with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod state;

use anyhow::Context;
use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use herakles_diskstats_exporter::{
    DiskMetrics, DiskstatsCollector, ExporterMetrics, HealthStats, DISKSTATS_FIELDS,
};
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal, sync::Mutex};
use tracing::{debug, error, info, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_test};
use config::{resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT};
use handlers::{health_handler, metrics_handler, root_handler};
use state::AppState;

/// Initializes tracing logging subsystem with the effective log level.
/// The CLI flag wins over the config file.
fn setup_logging(config: &Config) {
    let level = config.log_level().unwrap_or(LogLevel::Info);
    let log_level = match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {}", level.as_str());
}

/// Loads configuration and exits the process with error code 1 if it is invalid.
fn load_validated_config(args: &Args) -> anyhow::Result<Config> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, &args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config);

        return match command {
            Commands::Check => {
                if !command_check(&config)? {
                    std::process::exit(1);
                }
                Ok(())
            }
            Commands::Test {
                iterations,
                verbose,
            } => command_test(*iterations, *verbose, &config),
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config);

    info!("Starting herakles-diskstats-exporter");

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let collector = DiskstatsCollector::new(config.procfs_path(), config.device_filter()?);
    info!(
        "Diskstats collector reading {} (ignored devices: {})",
        collector.source_path().display(),
        collector.filter().pattern()
    );
    if let Err(e) = std::fs::File::open(collector.source_path()) {
        error!(
            "❌ Cannot open {}: {} - scrapes will fail until it becomes readable",
            collector.source_path().display(),
            e
        );
    }

    // Initialize Prometheus metrics registry
    let registry = Registry::new();
    let disk_metrics = DiskMetrics::new(&registry, &DISKSTATS_FIELDS)
        .context("failed to register diskstats metrics")?;
    let telemetry = if config.enable_telemetry.unwrap_or(true) {
        Some(ExporterMetrics::new(&registry).context("failed to register exporter metrics")?)
    } else {
        None
    };
    debug!("All metrics registered successfully");

    let state = Arc::new(AppState {
        registry,
        disk_metrics: Arc::new(Mutex::new(disk_metrics)),
        telemetry,
        collector: Arc::new(collector),
        config: Arc::new(config.clone()),
        health_stats: Arc::new(HealthStats::new()),
        start_time: Instant::now(),
    });

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", bind_ip_str, port))?;

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if state.config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state.clone());

    if config.enable_tls.unwrap_or(false) {
        // Paths are guaranteed by validate_effective_config()
        let (Some(cert_path), Some(key_path)) =
            (config.tls_cert_path.as_ref(), config.tls_key_path.as_ref())
        else {
            anyhow::bail!("TLS enabled without tls_cert_path and tls_key_path");
        };

        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .context("failed to load TLS configuration")?;

        info!(
            "herakles-diskstats-exporter listening on https://{}:{}",
            bind_ip_str, port
        );

        let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received, exiting...");
            }
        }
    } else {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        info!(
            "herakles-diskstats-exporter listening on http://{}:{}",
            bind_ip_str, port
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;
    }

    info!("herakles-diskstats-exporter stopped gracefully");
    Ok(())
}
