//! Dashsync Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Extract, normalize and load marketing and sales platform data into
//! per-tenant destination tables.
//!
//! # Supported Sources
//!
//! - **3CX**: call records, contacts and extensions
//! - **Meta**, **Google**, **RD Station**, **Exact Sales**, **Irroba**: declared,
//!   reported as skipped until implemented
//!
//! # Example
//!
//! ```no_run
//! use dashsync_ingest::config::IngestConfig;
//! use dashsync_ingest::loader::connect_store;
//! use dashsync_ingest::sources::{SourceKind, SourceRegistry};
//! use dashsync_ingest::trigger::{Dispatcher, SyncRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::load()?;
//!     let store = connect_store(&config.store).await?;
//!     let dispatcher = Dispatcher::new(
//!         SourceRegistry::from_config(&config)?,
//!         config.credentials.clone(),
//!         store,
//!     )
//!     .with_default_tenant(config.tenant_id);
//!
//!     let request = SyncRequest::new(None, vec![SourceKind::ThreeCx]);
//!     for report in dispatcher.dispatch(&request).await? {
//!         tracing::info!(source = %report.source, status = %report.status, "run finished");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod loader;
pub mod normalize;
pub mod orchestrator;
pub mod report;
pub mod sources;
pub mod trigger;

pub use error::{IngestError, Result};
