//! CLI command implementations for herakles-diskstats-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Diskstats source validation
//! - `config`: Configuration file generation
//! - `test`: Metrics collection testing

pub mod check;
pub mod config;
pub mod test;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
