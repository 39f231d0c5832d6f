//! Generate-sample command implementation.
//!
//! Writes a synthetic arcstats dump in the Linux kstat layout so that the
//! monitor can be exercised with `--source file` on machines without ZFS.

use chrono::Utc;
use rand::Rng;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// kstat data type of a 64-bit unsigned counter.
const KSTAT_DATA_UINT64: u8 = 4;

/// Writes a synthetic arcstats dump to `output`.
pub fn command_generate_sample(
    output: PathBuf,
    hit_ratio: f64,
    accesses: u64,
) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&hit_ratio) {
        anyhow::bail!("hit ratio must be within [0, 1], got {hit_ratio}");
    }
    debug!(
        "Generating sample: hit_ratio={}, accesses={}, output={}",
        hit_ratio,
        accesses,
        output.display()
    );

    let mut rng = rand::thread_rng();
    let content = render_sample(&mut rng, hit_ratio, accesses);
    fs::write(&output, &content)?;

    println!(
        "✅ Generated arcstats sample: {} lines in {}",
        content.lines().count(),
        output.display()
    );
    Ok(())
}

/// Renders a dump whose `hits`/`misses` split matches `hit_ratio`.
pub fn render_sample(rng: &mut impl Rng, hit_ratio: f64, accesses: u64) -> String {
    let hits = (accesses as f64 * hit_ratio).round() as u64;
    let misses = accesses - hits.min(accesses);

    let (demand_data_hits, rest_hits) = split(rng, hits, 0.55..0.75);
    let (demand_metadata_hits, prefetch_hits) = split(rng, rest_hits, 0.70..0.90);
    let (prefetch_data_hits, prefetch_metadata_hits) = split(rng, prefetch_hits, 0.40..0.60);

    let (demand_data_misses, rest_misses) = split(rng, misses, 0.50..0.70);
    let (demand_metadata_misses, prefetch_misses) = split(rng, rest_misses, 0.30..0.50);
    let (prefetch_data_misses, prefetch_metadata_misses) =
        split(rng, prefetch_misses, 0.60..0.90);

    // Memory: ARC target between 4 GiB and 64 GiB, current size close to it.
    const GIB: u64 = 1024 * 1024 * 1024;
    let c_max = rng.gen_range(4..=64) * GIB;
    let c_min = c_max / 32;
    let c = rng.gen_range(c_max / 2..=c_max);
    let size = rng.gen_range(c * 9 / 10..=c);
    let p = rng.gen_range(size / 4..=size / 2);
    let arc_meta_used = rng.gen_range(size / 10..=size / 4);
    let memory_all_bytes = c_max * 2;
    let memory_free_bytes = rng.gen_range(GIB..=memory_all_bytes / 4);

    let counters: [(&str, u64); 25] = [
        ("hits", hits),
        ("misses", misses),
        ("demand_data_hits", demand_data_hits),
        ("demand_data_misses", demand_data_misses),
        ("demand_metadata_hits", demand_metadata_hits),
        ("demand_metadata_misses", demand_metadata_misses),
        ("prefetch_data_hits", prefetch_data_hits),
        ("prefetch_data_misses", prefetch_data_misses),
        ("prefetch_metadata_hits", prefetch_metadata_hits),
        ("prefetch_metadata_misses", prefetch_metadata_misses),
        ("mru_hits", rng.gen_range(0..=hits / 2)),
        ("mfu_hits", rng.gen_range(0..=hits / 2)),
        ("deleted", rng.gen_range(0..=misses)),
        ("evict_skip", rng.gen_range(0..1000)),
        ("p", p),
        ("c", c),
        ("c_min", c_min),
        ("c_max", c_max),
        ("size", size),
        ("hdr_size", size / 200),
        ("data_size", size - arc_meta_used),
        ("metadata_size", arc_meta_used),
        ("arc_meta_used", arc_meta_used),
        ("memory_all_bytes", memory_all_bytes),
        ("memory_free_bytes", memory_free_bytes),
    ];

    let now_ns = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut out = String::new();
    writeln!(
        out,
        "13 1 0x01 {} {} {} {}",
        counters.len(),
        counters.len() * 24,
        now_ns / 2,
        now_ns
    )
    .ok();
    writeln!(out, "{:<32}{:<5}{}", "name", "type", "data").ok();
    for (name, value) in counters {
        writeln!(out, "{:<32}{:<5}{}", name, KSTAT_DATA_UINT64, value).ok();
    }
    out
}

fn split(rng: &mut impl Rng, total: u64, share: std::ops::Range<f64>) -> (u64, u64) {
    let first = (total as f64 * rng.gen_range(share)).round() as u64;
    let first = first.min(total);
    (first, total - first)
}
