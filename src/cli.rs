//! CLI arguments and subcommands for arcstats-monitor.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Where to read ARC counters from
#[derive(Debug, Clone, ValueEnum)]
pub enum SourceArg {
    Auto,
    Kstat,
    Sysctl,
    File,
}

impl SourceArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceArg::Auto => "auto",
            SourceArg::Kstat => "kstat",
            SourceArg::Sysctl => "sysctl",
            SourceArg::File => "file",
        }
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "arcstats-monitor",
    about = "ZFS ARC statistics monitor with rolling hit-ratio history",
    long_about = "ZFS ARC statistics monitor with rolling hit-ratio history.\n\n\
                  Periodically samples the ARC kstat counters, keeps a bounded in-memory \
                  history of hits, misses and hit ratio, and serves a read-only plain-text \
                  view of the latest snapshot.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Seconds between polls
    #[arg(short = 'i', long)]
    pub interval: Option<u64>,

    /// Number of history points to retain
    #[arg(long)]
    pub history_capacity: Option<usize>,

    /// Hit ratio below which health turns to warning (0.0 - 1.0)
    #[arg(long)]
    pub warning_threshold: Option<f64>,

    /// Seconds to wait for the stats source before giving up on a poll
    #[arg(long)]
    pub acquisition_timeout: Option<u64>,

    /// Stats source
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    /// Path for the kstat or file source
    #[arg(long)]
    pub source_path: Option<PathBuf>,

    /// Show raw integers instead of human-readable byte units
    #[arg(long)]
    pub raw_units: bool,

    /// Disable the HTTP view (collect and log only)
    #[arg(long)]
    pub disable_http: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and stats source
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Poll the stats source a few times and print the results
    Test {
        /// Number of polls
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Only show metrics whose name contains this text
        #[arg(short = 'f', long, default_value = "")]
        filter: String,
    },

    /// Write a synthetic arcstats dump for use with --source file
    GenerateSample {
        /// Output file path
        #[arg(short = 'o', long, default_value = "arcstats-sample.txt")]
        output: PathBuf,

        /// Target hit ratio of the generated counters (0.0 - 1.0)
        #[arg(long, default_value_t = 0.95)]
        hit_ratio: f64,

        /// Total number of ARC accesses to distribute over hits and misses
        #[arg(long, default_value_t = 1_000_000)]
        accesses: u64,
    },
}
