//! Error types for the RF bridge integration.

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Registry error types.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No device record with this id.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The transport could not deliver the payload.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error.
    #[error("Registry error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Errors returned by remote entity commands.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Token is neither numeric nor a learned button name.
    #[error("RF button not found: {0}")]
    ButtonNotFound(String),

    /// Token or button key is not a usable channel number.
    #[error("Invalid RF channel: {0}")]
    InvalidChannel(String),

    /// Command list was empty.
    #[error("Command list is empty")]
    EmptyCommand,

    /// Delivery through the registry failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
