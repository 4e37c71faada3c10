//! Command-line arguments.

use clap::Parser;
use shadow_core::{Configuration, LogLevel};
use std::path::PathBuf;

/// Shadow parallel discrete-event network simulator
#[derive(Parser, Debug)]
#[command(name = "shadow")]
#[command(version, about = "Run a network simulation scenario", long_about = None)]
pub struct Args {
    /// Master seed for determinism
    #[arg(short, long, default_value = "1")]
    pub seed: u64,

    /// Worker threads (0 = serial mode)
    #[arg(short, long, default_value = "0")]
    pub workers: usize,

    /// Log level (error, warning, message, debug, trace)
    #[arg(short, long, default_value = "message")]
    pub log_level: LogLevel,

    /// Minimum execution window in milliseconds
    #[arg(short, long, default_value = "10")]
    pub runahead: u64,

    /// Fail when the window is wider than the fastest path
    #[arg(long)]
    pub strict_runahead: bool,

    /// Run the built-in example scenario
    #[arg(long)]
    pub example: bool,

    /// JSON summary on stdout for CI parsing
    #[arg(long)]
    pub json: bool,

    /// Scenario files, parsed in order
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,
}

impl Args {
    /// Builds the run configuration.
    pub fn into_configuration(self) -> Configuration {
        Configuration {
            random_seed: self.seed,
            workers: self.workers,
            log_level: self.log_level,
            input_files: self.inputs,
            run_file_example: self.example,
            min_run_ahead: self.runahead,
            strict_run_ahead: self.strict_runahead,
        }
    }
}
