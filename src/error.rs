//! Error types for the wake relay

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the wake relay
///
/// Most of these never reach a client: each component converts upstream
/// failures into its own default value at its boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Realtime session credential issuance error
    #[error("credential error: {0}")]
    Credential(String),

    /// Auxiliary completion error
    #[error("completion error: {0}")]
    Completion(String),

    /// Lighting bridge error
    #[error("bridge error: {0}")]
    Bridge(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
