//! Error types for the Tollbooth service.

use thiserror::Error;

/// Main error type for Tollbooth operations.
#[derive(Error, Debug)]
pub enum TollboothError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (socket binding, config file reads)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Tollbooth operations.
pub type Result<T> = std::result::Result<T, TollboothError>;
