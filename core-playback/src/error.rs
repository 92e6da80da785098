//! # Playback Error Types
//!
//! Errors surfaced by the playback controller.
//!
//! Load and item failures never cross the public operation boundary: they
//! are stored inside [`Status::Error`](crate::status::Status::Error) and
//! announced through `DidUpdateStatus`. Handle methods only return an error
//! when the request itself cannot be delivered or is malformed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The engine could not load the source as playable.
    #[error("Source load failed: {0}")]
    LoadFailed(String),

    // ========================================================================
    // Item Errors
    // ========================================================================
    /// The attached item failed after it was handed to the engine.
    #[error("Item failed: {0}")]
    ItemFailed(String),

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The controller task is gone; the request was not delivered.
    #[error("Playback controller is closed")]
    ControllerClosed,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Runtime setup failed.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl PlaybackError {
    /// Returns `true` if the error originates from the media itself rather
    /// than from how the controller was used.
    pub fn is_media_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::LoadFailed(_) | PlaybackError::ItemFailed(_)
        )
    }
}

impl From<core_runtime::Error> for PlaybackError {
    fn from(error: core_runtime::Error) -> Self {
        match error {
            core_runtime::Error::Config(message) => PlaybackError::InvalidConfiguration(message),
            other => PlaybackError::Runtime(other.to_string()),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
