use std::path::PathBuf;
use thiserror::Error;

/// Domain failure raised by a plugin while checking extractability
#[derive(Debug, Error)]
pub enum DetectableError {
    #[error("Failed to resolve {tool}: {message}")]
    Resolution { tool: String, message: String },

    #[error("I/O error while preparing {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DetectableError {
    pub fn resolution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Failure building the evaluation tree; the only error that aborts a scan
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Source path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Source path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid directory exclusion pattern '{pattern}': {source}")]
    InvalidExclusion {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    #[error("Failed to read directory {}: {message}", .path.display())]
    ReadFailed { path: PathBuf, message: String },
}
