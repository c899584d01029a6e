//! Error types for Recall

use thiserror::Error;

/// Main error type for Recall operations
#[derive(Error, Debug)]
pub enum RecallError {
    /// Configuration errors (settings file, engine rejecting the backend config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Memory engine failures (network, auth, malformed backend state)
    #[error("Engine error: {0}")]
    Engine(String),

    /// Transport/RPC errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Recall operations
pub type Result<T> = std::result::Result<T, RecallError>;
