//! Error types for Dashsync

use thiserror::Error;

/// Result type alias for Dashsync operations
pub type Result<T> = std::result::Result<T, DashsyncError>;

/// Main error type for Dashsync
#[derive(Error, Debug)]
pub enum DashsyncError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid tenant id: {0}")]
    InvalidTenant(String),

    #[error("Invalid sync status: {0}")]
    InvalidSyncStatus(String),
}
