//! Error types for dune-export.
//!
//! Defines the main error enum used by both pipelines.

use std::path::Path;
use thiserror::Error;

/// Main error type for dune-export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Remote call failed (network, timeout, non-2xx response).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Expected field or structure missing from a payload or input file.
    #[error("Data shape error: {0}")]
    DataShape(String),

    /// The remote execution did not reach the completed state.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration errors (missing API key, invalid config file, bad flags).
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors while reading inputs or writing outputs.
    #[error("I/O error: {0}")]
    Io(String),
}

impl ExportError {
    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a data shape error with the given message.
    pub fn data_shape(msg: impl Into<String>) -> Self {
        Self::DataShape(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an I/O error that names the path involved.
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io(format!("{}: {}", path.display(), err))
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Transport Error",
            Self::DataShape(_) => "Data Shape Error",
            Self::Execution(_) => "Execution Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
        }
    }
}

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;
