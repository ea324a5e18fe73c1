//! Error types for sheet synchronization.

use thiserror::Error;

/// Main error type for sync operations.
///
/// None of these are fatal to a running manager: the coordinator logs them and
/// waits for the next scheduled tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote returned non-success status {0}")]
    HttpStatus(u16),

    #[error("Shared store error: {0}")]
    Store(String),

    #[error("Broadcast error: {0}")]
    Broadcast(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn scheduler thread: {0}")]
    Spawn(String),

    #[error("Manager has been destroyed")]
    Destroyed,
}

impl SyncError {
    /// Remote fetch unreachable or answered with a non-success status.
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport(_) | SyncError::HttpStatus(_))
    }

    /// Shared store unreachable or transaction failed.
    pub fn is_store(&self) -> bool {
        matches!(self, SyncError::Store(_))
    }

    /// Publish or subscribe failed.
    pub fn is_broadcast(&self) -> bool {
        matches!(self, SyncError::Broadcast(_))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            SyncError::Deserialization(e.to_string())
        } else {
            SyncError::Serialization(e.to_string())
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
