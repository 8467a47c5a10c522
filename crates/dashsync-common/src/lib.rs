//! Dashsync Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Dashsync workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across all Dashsync workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Checksums**: Content hashing for normalized rows
//! - **Logging**: Centralized `tracing` subscriber setup
//! - **Types**: Tenant identifiers and sync status shared by loaders and readers
//!
//! # Example
//!
//! ```no_run
//! use dashsync_common::checksum::content_hash;
//! use dashsync_common::types::TenantId;
//!
//! fn main() -> dashsync_common::Result<()> {
//!     let tenant: TenantId = "7b0c1d8e-3f4a-4c5b-9d6e-0f1a2b3c4d5e".parse()?;
//!     let hash = content_hash(&serde_json::json!({ "call_id": "A1" }))?;
//!     tracing::info!(%tenant, %hash, "hashed row");
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{DashsyncError, Result};
