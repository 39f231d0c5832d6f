//! Parser for raw ARC counter dumps.
//!
//! Two line forms are accepted:
//!
//! - kstat: `name type value`, as found in `/proc/spl/kstat/zfs/arcstats`
//! - sysctl: `kstat.zfs.misc.arcstats.name: value`, as printed by `sysctl`
//!
//! Every line is handled on its own. Bad lines are counted and skipped, so a
//! single corrupt counter never costs the whole snapshot.

use ahash::AHashSet as HashSet;
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::error::ParseFailure;
use crate::snapshot::{Metric, MetricSnapshot, ParseReport};

/// Prefix of every ARC key in `sysctl` output.
pub const SYSCTL_PREFIX: &str = "kstat.zfs.misc.arcstats.";

/// Outcome of classifying a single line.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Header,
    Malformed,
    Metric(&'a str, u64),
}

/// Parses UTF-8 bytes from a stats source.
pub fn parse_bytes(raw: &[u8], captured_at: DateTime<Utc>) -> Result<MetricSnapshot, ParseFailure> {
    let text = std::str::from_utf8(raw).map_err(|_| ParseFailure::MalformedEncoding)?;
    parse(text, captured_at)
}

/// Parses one counter dump into a snapshot stamped with `captured_at`.
pub fn parse(raw: &str, captured_at: DateTime<Utc>) -> Result<MetricSnapshot, ParseFailure> {
    if raw.trim().is_empty() {
        return Err(ParseFailure::SourceUnavailable);
    }

    let mut report = ParseReport::default();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut metrics = Vec::new();

    for (lineno, line) in raw.lines().enumerate() {
        match classify_line(line) {
            Line::Header => report.header_lines += 1,
            Line::Malformed => {
                trace!("Skipping malformed line {}: {:?}", lineno + 1, line);
                report.malformed_lines += 1;
            }
            Line::Metric(name, value) => {
                if seen.insert(name) {
                    metrics.push(Metric {
                        name: name.to_string(),
                        value,
                    });
                } else {
                    trace!("Skipping duplicate metric {} on line {}", name, lineno + 1);
                    report.duplicate_names += 1;
                }
            }
        }
    }

    if metrics.is_empty() {
        debug!(
            "No valid metrics in {} lines ({} malformed)",
            raw.lines().count(),
            report.malformed_lines
        );
        return Err(ParseFailure::NoValidMetrics);
    }

    debug!(
        "Parsed {} metrics ({} malformed, {} duplicate, {} header lines)",
        metrics.len(),
        report.malformed_lines,
        report.duplicate_names,
        report.header_lines
    );

    Ok(MetricSnapshot::new(captured_at, metrics, report))
}

fn classify_line(line: &str) -> Line<'_> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        &[] => Line::Header,
        &[key, value] if key.ends_with(':') => {
            let key = key.trim_end_matches(':');
            let name = key.strip_prefix(SYSCTL_PREFIX).unwrap_or(key);
            metric_or_malformed(name, value)
        }
        &["name", "type", "data"] => Line::Header,
        &[first, ..] if first.starts_with(|c: char| c.is_ascii_digit()) => Line::Header,
        &[name, _kind, value] => metric_or_malformed(name, value),
        _ => Line::Malformed,
    }
}

fn metric_or_malformed<'a>(name: &'a str, value: &str) -> Line<'a> {
    if !is_valid_name(name) {
        return Line::Malformed;
    }
    match value.parse::<u64>() {
        Ok(v) => Line::Metric(name, v),
        Err(_) => Line::Malformed,
    }
}

/// Metric names start with a letter or underscore and contain only
/// ASCII alphanumerics, underscores and dots.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    const KSTAT: &str = "\
13 1 0x01 123 33456 2340897234 98234234234
name                            type data
hits                            4    1500
misses                          4    100
demand_data_hits                4    900
size                            4    1073741824
c_max                           4    8589934592
";

    fn names(snap: &MetricSnapshot) -> Vec<&str> {
        snap.metrics().iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_parse_kstat_dump() {
        let snap = parse(KSTAT, Utc::now()).unwrap();
        assert_eq!(
            names(&snap),
            vec!["hits", "misses", "demand_data_hits", "size", "c_max"]
        );
        assert_eq!(snap.value("size"), Some(1073741824));
        assert_eq!(snap.report().header_lines, 2);
        assert_eq!(snap.report().malformed_lines, 0);
        assert_eq!(snap.derived().total_hits, 1500);
    }

    #[test]
    fn test_parse_sysctl_dump() {
        let raw = "kstat.zfs.misc.arcstats.hits: 80\nkstat.zfs.misc.arcstats.misses: 20\n";
        let snap = parse(raw, Utc::now()).unwrap();
        assert_eq!(names(&snap), vec!["hits", "misses"]);
        assert!((snap.derived().hit_ratio - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_lines_are_skipped_and_counted() {
        let raw = "\
hits 4 10
misses 4 notanumber
bogus
demand_hits 4 -3
too many tokens here 5
size 4 2048
";
        let snap = parse(raw, Utc::now()).unwrap();
        assert_eq!(names(&snap), vec!["hits", "size"]);
        assert_eq!(snap.report().malformed_lines, 4);
        // A failed value is dropped, never read as zero.
        assert!(snap.get("misses").is_none());
    }

    #[test]
    fn test_k_valid_m_malformed_keeps_order() {
        let raw = "a 4 1\nx\nb 4 2\ny 4 z\nc 4 3\n";
        let snap = parse(raw, Utc::now()).unwrap();
        assert_eq!(snap.len(), 3);
        assert_eq!(names(&snap), vec!["a", "b", "c"]);
        assert_eq!(snap.report().malformed_lines, 2);
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let raw = "hits 4 10\nhits 4 99\n";
        let snap = parse(raw, Utc::now()).unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.value("hits"), Some(10));
        assert_eq!(snap.report().duplicate_names, 1);
    }

    #[test]
    fn test_empty_input_is_source_unavailable() {
        assert_eq!(
            parse("", Utc::now()).unwrap_err(),
            ParseFailure::SourceUnavailable
        );
        assert_eq!(
            parse("  \n\n", Utc::now()).unwrap_err(),
            ParseFailure::SourceUnavailable
        );
    }

    #[test]
    fn test_all_malformed_is_no_valid_metrics() {
        assert_eq!(
            parse("garbage\nmore garbage here\n", Utc::now()).unwrap_err(),
            ParseFailure::NoValidMetrics
        );
        // Headers alone produce nothing either.
        assert_eq!(
            parse("name type data\n", Utc::now()).unwrap_err(),
            ParseFailure::NoValidMetrics
        );
    }

    #[test]
    fn test_invalid_utf8_is_malformed_encoding() {
        let raw: &[u8] = &[b'h', b'i', 0xff, 0xfe, b'\n'];
        assert_eq!(
            parse_bytes(raw, Utc::now()).unwrap_err(),
            ParseFailure::MalformedEncoding
        );
    }

    #[test]
    fn test_captured_at_is_preserved() {
        let at = Utc::now();
        let snap = parse("hits 4 1\n", at).unwrap();
        assert_eq!(snap.captured_at(), at);
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("l2_hdr_size"));
        assert!(is_valid_name("_private"));
        assert!(!is_valid_name("9lives"));
        assert!(!is_valid_name("bad-name"));
        assert!(!is_valid_name(""));
    }
}
