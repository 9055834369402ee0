//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "sorter", version, about = "Single-lane weight sorter")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/sorter.toml")]
    pub config: PathBuf,

    /// Print results and logs as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sort items on the simulated line
    Run {
        /// Scenario CSV with a single `grams` column; defaults to a short demo batch
        #[arg(long, value_name = "FILE")]
        items: Option<PathBuf>,
        /// Stop after this many sorted items
        #[arg(long, value_name = "N")]
        max_cycles: Option<u64>,
        /// Override timing.tick_ms
        #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
        tick_ms: Option<u64>,
    },
    /// Validate the config and run the power-on sequence on the simulator
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}
