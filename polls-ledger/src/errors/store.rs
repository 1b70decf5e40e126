use thiserror::Error;

/// Represents errors raised by device-local storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Local storage unavailable: {0}")]
    Unavailable(String),
}
