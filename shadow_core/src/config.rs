//! Simulation configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log verbosity, using the simulator's level names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    #[default]
    Message,
    Debug,
    Trace,
}

impl LogLevel {
    /// Returns the `tracing` filter directive for this level.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Message => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Returns the level name.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Message => "message",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" | "critical" => Ok(LogLevel::Error),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "message" | "info" => Ok(LogLevel::Message),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Configuration for a simulation run.
///
/// Validated by whoever builds it (the CLI); the master reads it and never
/// changes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Master seed from which every random stream in the run derives
    pub random_seed: u64,

    /// Worker threads (0 = serial, single-threaded mode)
    pub workers: usize,

    /// Log verbosity
    pub log_level: LogLevel,

    /// Scenario files, parsed in order
    pub input_files: Vec<PathBuf>,

    /// Run the built-in example scenario instead of `input_files`
    pub run_file_example: bool,

    /// Minimum execution window in milliseconds
    pub min_run_ahead: u64,

    /// Fail instead of warn when the run-ahead exceeds the fastest path
    pub strict_run_ahead: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            random_seed: 1,
            workers: 0,
            log_level: LogLevel::Message,
            input_files: Vec::new(),
            run_file_example: false,
            min_run_ahead: 10,
            strict_run_ahead: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("critical".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Message);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Message.as_filter(), "info");
        assert_eq!(LogLevel::Warning.as_filter(), "warn");
        assert_eq!(LogLevel::default(), LogLevel::Message);
    }

    #[test]
    fn test_default_configuration_is_serial() {
        let config = Configuration::default();
        assert_eq!(config.workers, 0);
        assert_eq!(config.min_run_ahead, 10);
        assert!(config.input_files.is_empty());
    }

    #[test]
    fn test_configuration_json_roundtrip() {
        let config = Configuration {
            workers: 4,
            log_level: LogLevel::Debug,
            input_files: vec![PathBuf::from("net.json")],
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"log_level\":\"debug\""));
        let back: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
