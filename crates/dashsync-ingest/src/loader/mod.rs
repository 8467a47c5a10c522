//! Loading normalized batches into the destination store
//!
//! A [`RecordStore`] performs bulk upserts keyed on `(tenant_id, natural
//! key)`. The [`Loader`] sits in front of it and enforces the per-table
//! contract: empty batches never reach the store, non-empty ones reach it in
//! exactly one call, and every failure names the table.

pub mod memory;
pub mod postgres;
pub mod supabase;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use supabase::SupabaseStore;

use crate::config::{StoreConfig, StoreKind};
use crate::error::{IngestError, Result};
use crate::normalize::{Row, TableBatch, TableSpec};
use crate::report::{RunReport, TableOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Destination store backend
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Upsert all `rows` into `table` in one all-or-nothing call
    ///
    /// Returns the number of rows inserted or changed.
    async fn upsert(&self, table: &TableSpec, rows: &[Row]) -> Result<u64>;

    /// Persist a finished run in the run ledger
    async fn record_run(&self, report: &RunReport) -> Result<()>;
}

/// Per-table write path in front of a [`RecordStore`]
#[derive(Clone)]
pub struct Loader {
    store: Arc<dyn RecordStore>,
}

impl Loader {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Load one batch; errors are attributed to the batch's table
    pub async fn load(&self, batch: &TableBatch) -> Result<TableOutcome> {
        if batch.is_empty() {
            debug!(table = batch.table.name, "Empty batch, skipping write");
            return Ok(TableOutcome::Empty);
        }

        let written = self
            .store
            .upsert(&batch.table, &batch.rows)
            .await
            .map_err(|e| e.for_table(batch.table.name))?;

        info!(
            table = batch.table.name,
            store = self.store.name(),
            rows = batch.len(),
            written,
            "Upserted batch"
        );

        Ok(TableOutcome::Loaded {
            rows: batch.len(),
            written,
        })
    }
}

/// Build the store selected by `config`
pub async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.kind {
        StoreKind::Postgres => Arc::new(PostgresStore::connect(&config.database).await?),
        StoreKind::Supabase => {
            let url = config.supabase.url.clone().ok_or_else(|| {
                IngestError::Config("SUPABASE_URL is required for the supabase store".to_string())
            })?;
            let key = config.supabase.service_key.clone().ok_or_else(|| {
                IngestError::Config(
                    "SUPABASE_SERVICE_KEY is required for the supabase store".to_string(),
                )
            })?;
            Arc::new(SupabaseStore::new(url, key)?)
        },
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };

    info!(store = store.name(), "Destination store ready");
    Ok(store)
}

/// Quote a Postgres identifier; table names such as `3cx_contacts` need it
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Union of the rows' columns in first-seen order
pub(crate) fn columns_of(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}
