//! Check command implementation.
//!
//! Validates the configuration and performs one acquisition and parse
//! against the configured stats source.

use arcstats_monitor::config::Config;
use arcstats_monitor::parser;
use arcstats_monitor::source::source_from_settings;
use chrono::Utc;

/// Validates configuration and stats source. Returns `false` if any check failed.
pub fn command_check(config: &Config) -> anyhow::Result<bool> {
    println!("🔍 ARC Stats Monitor - System Check");
    println!("===================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    let settings = match config.engine_settings() {
        Ok(settings) => {
            println!("   ✅ Configuration is valid");
            println!(
                "   ├─ poll interval: {}s, history capacity: {}",
                settings.poll_interval.as_secs(),
                settings.history_capacity
            );
            println!(
                "   └─ warning threshold: {:.2}, units: {}",
                settings.hit_ratio_warning_threshold, settings.unit_mode
            );
            settings
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            println!("\n📋 Summary:");
            println!("   ❌ Some checks failed - please review warnings");
            return Ok(false);
        }
    };

    println!("\n📁 Checking stats source...");
    let source = source_from_settings(&settings)?;
    println!("   ├─ using {}", source.describe());
    match source.fetch_raw() {
        Ok(raw) => {
            println!("   ✅ Read {} bytes", raw.len());
            match parser::parse_bytes(&raw, Utc::now()) {
                Ok(snapshot) => {
                    println!("   ✅ Parsed {} metrics", snapshot.len());
                    let report = snapshot.report();
                    if report.defects() > 0 {
                        println!(
                            "   ⚠️  Skipped {} malformed and {} duplicate lines",
                            report.malformed_lines, report.duplicate_names
                        );
                    }
                    let derived = snapshot.derived();
                    println!(
                        "   └─ hit ratio {:.2}% ({} hits, {} misses)",
                        derived.hit_ratio * 100.0,
                        derived.total_hits,
                        derived.total_misses
                    );
                }
                Err(e) => {
                    println!("   ❌ Parse failed: {}", e);
                    all_ok = false;
                }
            }
        }
        Err(e) => {
            println!("   ❌ Acquisition failed: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
    } else {
        println!("   ❌ Some checks failed - please review warnings");
    }
    Ok(all_ok)
}
