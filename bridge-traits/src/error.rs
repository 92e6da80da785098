//! Errors reported by host bridge implementations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host does not offer this capability (no lock-screen controls on a
    /// headless box, for example).
    #[error("Host capability not available: {0}")]
    NotAvailable(String),

    /// The engine or platform refused a command.
    #[error("Host operation failed: {0}")]
    OperationFailed(String),

    /// Probing a media source failed: missing file, unreachable stream,
    /// unsupported container.
    #[error("Media source unavailable: {0}")]
    SourceUnavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
