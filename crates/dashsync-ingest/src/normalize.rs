//! Normalization of platform records into destination rows
//!
//! A destination row is a flat JSON object whose keys are the table's
//! columns. On top of the business attributes produced by each source,
//! every row is stamped with the audit columns below.

use crate::error::Result;
use chrono::{DateTime, Utc};
use dashsync_common::checksum::content_hash;
use dashsync_common::types::{SyncStatus, TenantId};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// A normalized row, column name to value
pub type Row = serde_json::Map<String, Value>;

pub const TENANT_COLUMN: &str = "tenant_id";
pub const SYNC_STATUS_COLUMN: &str = "sync_status";
/// Start of the sync that last changed the row; unchanged rows keep the old value
pub const LAST_SYNC_AT_COLUMN: &str = "last_sync_at";
pub const CONTENT_HASH_COLUMN: &str = "content_hash";

/// A destination table and the column holding the external natural key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TableSpec {
    pub name: &'static str,
    pub natural_key: &'static str,
}

impl TableSpec {
    pub const fn new(name: &'static str, natural_key: &'static str) -> Self {
        Self { name, natural_key }
    }

    /// Columns forming the upsert conflict target
    pub fn conflict_columns(&self) -> [&'static str; 2] {
        [TENANT_COLUMN, self.natural_key]
    }
}

impl std::fmt::Display for TableSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Per-run values stamped on every row
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub run_id: Uuid,
    pub tenant_id: TenantId,
    pub started_at: DateTime<Utc>,
}

impl SyncContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            tenant_id,
            started_at: Utc::now(),
        }
    }
}

/// Normalized rows bound for one table
#[derive(Debug, Clone)]
pub struct TableBatch {
    pub table: TableSpec,
    pub rows: Vec<Row>,
    /// Records dropped because they had no natural key
    pub rejected: usize,
}

impl TableBatch {
    pub fn empty(table: TableSpec) -> Self {
        Self {
            table,
            rows: Vec::new(),
            rejected: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Render a natural key value as the string the store de-duplicates on
fn natural_key_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Turn destination-shaped records into a batch for `table`
///
/// Records without a natural key are counted in `rejected`. When the same
/// key appears more than once the later record wins but keeps the position
/// of the first, so the store never sees two rows with one conflict target.
pub fn normalize_batch<T, I>(table: TableSpec, records: I, ctx: &SyncContext) -> Result<TableBatch>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut batch = TableBatch::empty(table);
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let mut row = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            other => {
                warn!(table = table.name, value = %other, "Record is not an object, rejecting");
                batch.rejected += 1;
                continue;
            },
        };

        let Some(key) = natural_key_of(row.get(table.natural_key)) else {
            warn!(table = table.name, key = table.natural_key, "Record has no natural key, rejecting");
            batch.rejected += 1;
            continue;
        };
        row.insert(table.natural_key.to_string(), Value::String(key.clone()));

        let hash = content_hash(&Value::Object(row.clone()))?;
        row.insert(TENANT_COLUMN.to_string(), Value::String(ctx.tenant_id.to_string()));
        row.insert(
            SYNC_STATUS_COLUMN.to_string(),
            Value::String(SyncStatus::Synced.as_str().to_string()),
        );
        row.insert(LAST_SYNC_AT_COLUMN.to_string(), Value::String(ctx.started_at.to_rfc3339()));
        row.insert(CONTENT_HASH_COLUMN.to_string(), Value::String(hash));

        match positions.get(&key) {
            Some(&idx) => batch.rows[idx] = row,
            None => {
                positions.insert(key, batch.rows.len());
                batch.rows.push(row);
            },
        }
    }

    if batch.rejected > 0 {
        warn!(table = table.name, rejected = batch.rejected, kept = batch.rows.len(), "Rejected records during normalization");
    }

    Ok(batch)
}
