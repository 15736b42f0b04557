//! Error types for voice-cart

use thiserror::Error;

/// Result type alias for voice-cart operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in voice-cart
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Product vocabulary could not be loaded
    #[error("failed to load products: {0}")]
    ConfigLoad(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Recognition engine error
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Speech recognition is not authorized
    #[error("speech recognition not authorized: {0}")]
    NotAuthorized(String),

    /// Session event queue closed
    #[error("session closed")]
    SessionClosed,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
