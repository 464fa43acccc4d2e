//! Configuration management for herakles-diskstats-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use clap::ValueEnum;
use herakles_diskstats_exporter::{DeviceFilter, DEFAULT_IGNORED_DEVICES, DEFAULT_PROCFS_PATH};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9215;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid diskstats_ignored_devices pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Diskstats collector
    #[serde(alias = "procfs-path")]
    pub procfs_path: Option<PathBuf>,
    #[serde(alias = "diskstats-ignored-devices")]
    pub diskstats_ignored_devices: Option<String>,

    // Feature flags
    pub enable_health: Option<bool>,
    pub enable_telemetry: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            procfs_path: Some(PathBuf::from(DEFAULT_PROCFS_PATH)),
            diskstats_ignored_devices: Some(DEFAULT_IGNORED_DEVICES.to_string()),
            enable_health: Some(true),
            enable_telemetry: Some(true),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Config {
    pub fn procfs_path(&self) -> PathBuf {
        self.procfs_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROCFS_PATH))
    }

    pub fn ignored_devices(&self) -> &str {
        self.diskstats_ignored_devices
            .as_deref()
            .unwrap_or(DEFAULT_IGNORED_DEVICES)
    }

    /// Effective log level. Unknown names are rejected by validation.
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        match self.log_level.as_deref() {
            None => Ok(LogLevel::Info),
            Some(name) => LogLevel::from_str(name, true)
                .map_err(|_| ConfigError::Invalid(format!("unknown log_level: {}", name))),
        }
    }

    /// Compiles the configured device filter.
    pub fn device_filter(&self) -> Result<DeviceFilter, ConfigError> {
        Ok(DeviceFilter::new(self.ignored_devices())?)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    cfg.device_filter()?;
    cfg.log_level()?;

    if cfg
        .procfs_path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::Invalid("procfs_path must not be empty".into()));
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                ));
            }
            (Some(_), None) => {
                return Err(ConfigError::Invalid(
                    "TLS is enabled but tls_key_path is not set".into(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::Invalid(
                    "TLS is enabled but tls_cert_path is not set".into(),
                ));
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

/// Checks that a TLS file exists, is readable and not empty.
fn check_pem_file(path: &str, what: &str) -> Result<(), ConfigError> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(ConfigError::Invalid(format!(
            "TLS {} file is empty: {}",
            what, path
        ))),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::Invalid(
            format!("TLS {} file not found: {}", what, path),
        )),
        Err(e) => Err(ConfigError::Invalid(format!(
            "TLS {} file is not readable: {} ({})",
            what, path, e
        ))),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // Override with CLI args
    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Only override port if the user supplied it on the CLI.
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    if let Some(path) = &args.procfs_path {
        config.procfs_path = Some(path.clone());
    }
    if let Some(pattern) = &args.ignored_devices {
        config.diskstats_ignored_devices = Some(pattern.clone());
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            // Try default locations
            let defaults = [
                "/etc/herakles/diskstats-exporter.yaml",
                "/etc/herakles/diskstats-exporter.yml",
                "/etc/herakles/diskstats-exporter.json",
                "./herakles-diskstats-exporter.yaml",
                "./herakles-diskstats-exporter.yml",
                "./herakles-diskstats-exporter.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let path_str = path.display().to_string();
    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path_str.clone(),
        source,
    })?;
    let parse_err = |message: String| ConfigError::Parse {
        path: path_str.clone(),
        message,
    };

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        Some("toml") => toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
    };
    info!("Loaded configuration from: {}", path_str);

    Ok(merge_defaults(config))
}

/// Fills unset fields from the defaults.
fn merge_defaults(config: Config) -> Config {
    let defaults = Config::default();
    Config {
        port: config.port.or(defaults.port),
        bind: config.bind.or(defaults.bind),
        procfs_path: config.procfs_path.or(defaults.procfs_path),
        diskstats_ignored_devices: config
            .diskstats_ignored_devices
            .or(defaults.diskstats_ignored_devices),
        enable_health: config.enable_health.or(defaults.enable_health),
        enable_telemetry: config.enable_telemetry.or(defaults.enable_telemetry),
        log_level: config.log_level.or(defaults.log_level),
        enable_tls: config.enable_tls.or(defaults.enable_tls),
        tls_cert_path: config.tls_cert_path,
        tls_key_path: config.tls_key_path,
    }
}

/// Renders configuration in the requested format.
pub fn render_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn write_config(ext: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_effective_config(&config).is_ok());
        assert_eq!(config.ignored_devices(), DEFAULT_IGNORED_DEVICES);
        assert_eq!(config.procfs_path(), PathBuf::from("/proc"));
    }

    #[test]
    fn test_load_yaml_merges_defaults() {
        let file = write_config(
            "yaml",
            "procfs_path: /host/proc\ndiskstats_ignored_devices: \"^loop\\\\d+$\"\n",
        );
        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.procfs_path(), PathBuf::from("/host/proc"));
        assert_eq!(config.ignored_devices(), r"^loop\d+$");
        assert_eq!(config.port, Some(DEFAULT_PORT));
    }

    #[test]
    fn test_load_json_and_toml() {
        let json = write_config("json", r#"{"port": 9300}"#);
        assert_eq!(load_config(Some(json.path())).unwrap().port, Some(9300));

        let toml = write_config("toml", "port = 9301\n");
        assert_eq!(load_config(Some(toml.path())).unwrap().port, Some(9301));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let file = write_config("yaml", "port: [not a port\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_pattern_fails_validation() {
        let config = Config {
            diskstats_ignored_devices: Some("(".into()),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_tls_requires_both_paths() {
        let config = Config {
            enable_tls: Some(true),
            tls_cert_path: Some("/nonexistent/cert.pem".into()),
            ..Config::default()
        };
        let err = validate_effective_config(&config).unwrap_err();
        assert!(err.to_string().contains("tls_key_path"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = write_config("yaml", "port: 9300\nprocfs_path: /host/proc\n");
        let path = file.path().to_string_lossy().to_string();
        let args = Args::parse_from([
            "herakles-diskstats-exporter",
            "--config",
            path.as_str(),
            "--port",
            "9400",
            "--disable-health",
        ]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.port, Some(9400));
        assert_eq!(config.procfs_path(), PathBuf::from("/host/proc"));
        assert_eq!(config.enable_health, Some(false));
    }

    #[test]
    fn test_log_level_from_file_and_cli() {
        let file = write_config("yaml", "log_level: debug\n");
        let path = file.path().to_string_lossy().to_string();

        let args = Args::parse_from(["herakles-diskstats-exporter", "--config", path.as_str()]);
        let config = resolve_config(&args).unwrap();
        assert!(matches!(config.log_level(), Ok(LogLevel::Debug)));

        let args = Args::parse_from([
            "herakles-diskstats-exporter",
            "--config",
            path.as_str(),
            "--log-level",
            "warn",
        ]);
        let config = resolve_config(&args).unwrap();
        assert!(matches!(config.log_level(), Ok(LogLevel::Warn)));
    }

    #[test]
    fn test_unknown_log_level_fails_validation() {
        let config = Config {
            log_level: Some("verbose".into()),
            ..Config::default()
        };
        let err = validate_effective_config(&config).unwrap_err();
        assert!(err.to_string().contains("unknown log_level: verbose"));
    }

    #[test]
    fn test_render_config_formats() {
        let config = Config::default();
        let yaml = render_config(&config, &ConfigFormat::Yaml).unwrap();
        assert!(yaml.contains("diskstats_ignored_devices"));
        let json = render_config(&config, &ConfigFormat::Json).unwrap();
        assert!(json.contains("\"port\": 9215"));
    }
}
