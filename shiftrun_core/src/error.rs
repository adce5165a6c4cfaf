//! Error types for the shiftrun_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for shiftrun_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generator inputs rejected before any day is assigned
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Workday file could not be interpreted
    #[error("Workday map error: {0}")]
    Workdays(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
