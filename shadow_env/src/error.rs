//! Error types for the Shadow environment seams.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while turning scenario input into setup actions.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The scenario file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scenario text is malformed or describes invalid values
    #[error("Parse error: {0}")]
    Parse(String),
}

impl EnvError {
    /// Creates an I/O error for the given file.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
