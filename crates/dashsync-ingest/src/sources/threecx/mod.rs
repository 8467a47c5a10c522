//! 3CX phone system ingestion
//!
//! Pulls call records, contacts and extensions from a token-protected 3CX
//! instance and loads them into the `3cx_*` tables.

pub mod client;
pub mod models;

pub use client::{Endpoint, ThreeCxClient, ThreeCxExtract};
pub use models::{CallRecordRow, ContactRow, ExtensionRow};

use super::{SourceConnector, SourceKind};
use crate::credential::Credential;
use crate::error::{IngestError, Result};
use crate::http::ApiClient;
use crate::normalize::{normalize_batch, SyncContext, TableBatch, TableSpec};
use async_trait::async_trait;
use url::Url;

pub const CALL_RECORDS_TABLE: TableSpec = TableSpec::new("3cx_call_records", "call_id");
pub const CONTACTS_TABLE: TableSpec = TableSpec::new("3cx_contacts", "contact_id");
pub const EXTENSIONS_TABLE: TableSpec = TableSpec::new("3cx_extensions", "extension_number");

/// Map one 3CX extract to table batches
pub fn normalize(extract: ThreeCxExtract, ctx: &SyncContext) -> Result<Vec<TableBatch>> {
    Ok(vec![
        normalize_batch(
            CALL_RECORDS_TABLE,
            extract.call_records.into_iter().map(CallRecordRow::from),
            ctx,
        )?,
        normalize_batch(CONTACTS_TABLE, extract.contacts.into_iter().map(ContactRow::from), ctx)?,
        normalize_batch(
            EXTENSIONS_TABLE,
            extract.extensions.into_iter().map(ExtensionRow::from),
            ctx,
        )?,
    ])
}

/// 3CX connector; without a base URL every extract fails with a config error
pub struct ThreeCxConnector {
    client: Option<ThreeCxClient>,
}

impl ThreeCxConnector {
    pub fn new(api: ApiClient, base_url: Url) -> Self {
        Self {
            client: Some(ThreeCxClient::new(api, base_url)),
        }
    }

    pub fn unconfigured() -> Self {
        Self { client: None }
    }
}

#[async_trait]
impl SourceConnector for ThreeCxConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::ThreeCx
    }

    fn tables(&self) -> Vec<TableSpec> {
        vec![CALL_RECORDS_TABLE, CONTACTS_TABLE, EXTENSIONS_TABLE]
    }

    async fn extract(&self, credential: &Credential, ctx: &SyncContext) -> Result<Vec<TableBatch>> {
        let client = self.client.as_ref().ok_or_else(|| {
            IngestError::Config("DASHSYNC_THREECX_BASE_URL is not set".to_string())
        })?;

        let extract = client.fetch_all(credential).await?;
        normalize(extract, ctx)
    }
}
