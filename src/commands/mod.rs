//! CLI command implementations for arcstats-monitor.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Configuration and stats source validation
//! - `config`: Configuration file generation
//! - `test`: One-shot polling through the full pipeline
//! - `generate-sample`: Synthetic arcstats dump generation

pub mod check;
pub mod config;
pub mod generate;
pub mod test;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use generate::command_generate_sample;
pub use test::command_test;
