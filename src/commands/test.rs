//! Test command implementation.
//!
//! Runs collection cycles into an in-memory sink and displays results.

use herakles_diskstats_exporter::{DiskstatsCollector, Sample};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::Config;

/// Tests metrics collection.
pub fn command_test(iterations: usize, verbose: bool, config: &Config) -> anyhow::Result<()> {
    println!("🧪 Herakles Diskstats Exporter - Test Mode");
    println!("==========================================");

    let collector = DiskstatsCollector::new(config.procfs_path(), config.device_filter()?);
    println!("   📁 Source: {}", collector.source_path().display());

    let mut failures = 0usize;
    for iteration in 1..=iterations {
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let start = Instant::now();
        let mut samples: Vec<Sample> = Vec::new();
        let result = collector.update(&mut samples);
        let elapsed = start.elapsed();

        match &result {
            Ok(summary) => println!(
                "   ✅ {} devices exported, {} ignored in {:.2}ms",
                summary.devices_exported,
                summary.devices_ignored,
                elapsed.as_secs_f64() * 1000.0
            ),
            Err(e) => {
                failures += 1;
                println!("   ❌ Cycle failed after {} samples: {}", samples.len(), e);
            }
        }

        if verbose {
            for sample in &samples {
                println!(
                    "   {}{{device=\"{}\"}} {} ({})",
                    sample.name(),
                    sample.device,
                    sample.value,
                    sample.kind().as_str()
                );
            }
        } else {
            print_device_summary(&samples);
        }
    }

    println!("\n📋 Summary:");
    println!(
        "   {} of {} iterations succeeded",
        iterations - failures,
        iterations
    );
    if failures > 0 {
        anyhow::bail!("{} collection cycles failed", failures);
    }
    Ok(())
}

/// Prints read/write bytes and I/O time per device.
fn print_device_summary(samples: &[Sample]) {
    let mut devices: BTreeMap<&str, (f64, f64, f64)> = BTreeMap::new();
    for sample in samples {
        let entry = devices.entry(sample.device.as_str()).or_default();
        match sample.name() {
            "herakles_disk_read_bytes_total" => entry.0 = sample.value,
            "herakles_disk_written_bytes_total" => entry.1 = sample.value,
            "herakles_disk_io_time_seconds_total" => entry.2 = sample.value,
            _ => {}
        }
    }

    if devices.is_empty() {
        return;
    }

    println!(
        "   {:<16} {:>14} {:>14} {:>12}",
        "DEVICE", "READ (MB)", "WRITTEN (MB)", "IO TIME (s)"
    );
    for (device, (read, written, io_time)) in devices {
        println!(
            "   {:<16} {:>14.1} {:>14.1} {:>12.2}",
            device,
            read / 1024.0 / 1024.0,
            written / 1024.0 / 1024.0,
            io_time
        );
    }
}
