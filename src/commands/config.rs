//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files. Writes to stdout unless `output` names a
/// file other than `-`.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let content = render_default_config(&format, commented)?;

    match output {
        Some(path) if path.to_string_lossy() != "-" => {
            fs::write(&path, content)?;
            println!("✅ Configuration written to: {}", path.display());
        }
        _ => print!("{}", content),
    }

    Ok(())
}

/// Renders the default configuration. Comments are only available for
/// formats with a comment syntax.
fn render_default_config(format: &ConfigFormat, commented: bool) -> anyhow::Result<String> {
    let content = render_config(&Config::default(), format)?;
    Ok(match format {
        ConfigFormat::Yaml | ConfigFormat::Toml if commented => add_config_comments(content),
        ConfigFormat::Json if commented => {
            eprintln!("⚠️  JSON has no comment syntax, --commented is ignored");
            content
        }
        _ => content,
    })
}

/// Prepends a commented reference block. Valid in YAML and TOML.
fn add_config_comments(rendered: String) -> String {
    let comments = r#"# Herakles Diskstats Exporter Configuration
# ==========================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9215                   # HTTP port
#
# Diskstats Collector
# -------------------
# procfs_path: "/proc"         # diskstats is read from <procfs_path>/diskstats
# diskstats_ignored_devices: "^(ram|loop|fd|(h|s|v|xv)d[a-z]|nvme\d+n\d+p)\d+$"
#                              # Regexp of devices to ignore
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
# enable_telemetry: true       # Enable herakles_exporter_* metrics
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
"#;

    format!("{comments}\n{rendered}")
}
