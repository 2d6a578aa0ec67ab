//! Error types shared by the hub-side crates.

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or unreadable configuration value.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error.
    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}
