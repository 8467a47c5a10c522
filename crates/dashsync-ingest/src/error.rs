//! Error types for ingestion runs
//!
//! Three families matter to callers: credential errors (raised before any I/O),
//! upstream errors (raised while fetching) and store errors (raised while
//! loading, always naming the table).

use crate::sources::SourceKind;
use dashsync_common::DashsyncError;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for ETL runs
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Missing credential for {integration}: set {}", .integration.credential_env_var())]
    MissingCredential { integration: SourceKind },

    #[error("{integration} ingestion is not implemented")]
    NotImplemented { integration: SourceKind },

    #[error("Upstream error from {endpoint}: {status} {status_text}")]
    Upstream {
        endpoint: String,
        status: u16,
        status_text: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Pagination of {endpoint} exceeded {max_pages} pages")]
    PaginationLimit { endpoint: String, max_pages: usize },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to load table {table}: {message}")]
    Store { table: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] DashsyncError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Transient failures worth another attempt: timeouts, refused
    /// connections, throttling and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestError::Http(e) => e.is_timeout() || e.is_connect(),
            IngestError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Attach the destination table to an error raised by a store backend
    pub fn for_table(self, table: &str) -> Self {
        match self {
            IngestError::Store { .. } => self,
            other => IngestError::Store {
                table: table.to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(status: u16) -> IngestError {
        IngestError::Upstream {
            endpoint: "3cx call-records".to_string(),
            status,
            status_text: "whatever".to_string(),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(upstream(500).is_retryable());
        assert!(upstream(503).is_retryable());
        assert!(upstream(429).is_retryable());
        assert!(!upstream(401).is_retryable());
        assert!(!upstream(404).is_retryable());
        assert!(!IngestError::Config("x".to_string()).is_retryable());
    }

    #[test]
    fn test_for_table_wraps_once() {
        let err = IngestError::Config("connection refused".to_string()).for_table("3cx_contacts");
        assert_eq!(
            err.to_string(),
            "Failed to load table 3cx_contacts: Configuration error: connection refused"
        );

        let rewrapped = err.for_table("other_table");
        assert!(rewrapped.to_string().contains("3cx_contacts"));
    }

    #[test]
    fn test_missing_credential_names_env_var() {
        let err = IngestError::MissingCredential {
            integration: SourceKind::ThreeCx,
        };
        assert!(err.to_string().contains("DASHSYNC_THREECX_TOKEN"));
    }
}
