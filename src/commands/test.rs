//! Test command implementation.
//!
//! Runs a few one-shot polls through the full collector pipeline and prints
//! the resulting table, summary and health.

use arcstats_monitor::config::Config;
use arcstats_monitor::source::source_from_settings;
use arcstats_monitor::{Collector, PollOutcome};
use std::time::Instant;

use crate::handlers::stats::render_stats;

/// Polls `iterations` times, waiting one poll interval in between.
/// Returns the number of failed polls.
pub async fn command_test(
    config: &Config,
    iterations: usize,
    filter: &str,
) -> anyhow::Result<usize> {
    println!("🧪 ARC Stats Monitor - Test Mode");
    println!("================================");

    let settings = config.engine_settings()?;
    let interval = settings.poll_interval;
    let source = source_from_settings(&settings)?;
    let collector = Collector::new(source, settings)?;
    println!("   📁 Source: {}", collector.source_description());

    let mut failures = 0;
    for iteration in 1..=iterations {
        if iteration > 1 {
            tokio::time::sleep(interval).await;
        }
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let start = Instant::now();
        let outcome = collector.poll().await;
        println!(
            "   ⏱️  Poll duration: {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        match outcome {
            PollOutcome::Updated(snapshot) => {
                println!("   📊 Parsed {} metrics", snapshot.len());
                let view = collector.view();
                println!();
                print!("{}", render_stats(&view, filter, view.unit_mode()));
            }
            PollOutcome::Failed(e) => {
                failures += 1;
                println!("   ❌ Poll failed ({}): {}", e.kind, e.message);
            }
            PollOutcome::Skipped => println!("   ⚠️  Poll skipped"),
        }
    }

    println!("\n📉 History: {} points retained", collector.history_len());
    if failures == 0 {
        println!("\n✅ Test completed successfully");
    } else {
        println!("\n❌ Test completed with {} failed polls", failures);
    }
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_polls_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hits 4 90\nmisses 4 10\nsize 4 2048").unwrap();
        let cfg = Config {
            source: Some("file".into()),
            source_path: Some(file.path().to_path_buf()),
            poll_interval_seconds: Some(1),
            ..Config::default()
        };
        assert_eq!(command_test(&cfg, 2, "").await.unwrap(), 0);
        assert_eq!(command_test(&cfg, 1, "hit").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            source: Some("file".into()),
            source_path: Some(dir.path().join("missing")),
            ..Config::default()
        };
        assert_eq!(command_test(&cfg, 1, "").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_is_an_error() {
        let cfg = Config {
            unit_mode: Some("metric".into()),
            ..Config::default()
        };
        assert!(command_test(&cfg, 1, "").await.is_err());
    }
}
