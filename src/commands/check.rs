//! Check command implementation.
//!
//! Validates configuration and the diskstats source.

use herakles_diskstats_exporter::{DiskstatsCollector, Sample};
use std::fs::File;

use crate::config::{validate_effective_config, Config};

/// Validates configuration and runs one collection cycle.
///
/// Returns `Ok(false)` if any check failed.
pub fn command_check(config: &Config) -> anyhow::Result<bool> {
    println!("🔍 Herakles Diskstats Exporter - System Check");
    println!("=============================================");

    let mut all_ok = true;

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    let filter = match validate_effective_config(config).and_then(|_| config.device_filter()) {
        Ok(filter) => {
            println!("   ✅ Configuration is valid");
            println!("   ✅ Ignored devices pattern: {}", filter.pattern());
            filter
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            return Ok(false);
        }
    };

    let collector = DiskstatsCollector::new(config.procfs_path(), filter);
    let source = collector.source_path();

    // Check diskstats source
    println!("\n📁 Checking {}...", source.display());
    match File::open(&source) {
        Ok(_) => println!("   ✅ {} readable", source.display()),
        Err(e) => {
            println!("   ❌ Cannot open {}: {}", source.display(), e);
            all_ok = false;
        }
    }

    if all_ok {
        println!("\n💾 Running one collection cycle...");
        let mut samples: Vec<Sample> = Vec::new();
        match collector.update(&mut samples) {
            Ok(summary) => {
                println!(
                    "   ✅ {} devices exported, {} ignored, {} samples",
                    summary.devices_exported, summary.devices_ignored, summary.samples_emitted
                );
            }
            Err(e) => {
                println!("   ❌ Collection failed: {}", e);
                if !samples.is_empty() {
                    println!("   ⚠️  {} samples were emitted before the failure", samples.len());
                }
                all_ok = false;
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
    } else {
        println!("   ❌ Some checks failed - please review the output above");
    }
    Ok(all_ok)
}
