//! In-memory store used by `--dry-run` and tests

use super::RecordStore;
use crate::error::{IngestError, Result};
use crate::normalize::{Row, TableSpec, CONTENT_HASH_COLUMN, TENANT_COLUMN};
use crate::report::RunReport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    /// table -> (tenant, natural key) -> row
    tables: HashMap<String, BTreeMap<(String, String), Row>>,
    upsert_calls: Vec<(String, usize)>,
    runs: Vec<RunReport>,
}

/// Upserts into per-table maps with the same conflict rules as Postgres
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    failing_tables: HashSet<String>,
}

fn column_text(row: &Row, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upsert into `table` fail after being counted
    pub fn with_failing_table(mut self, table: impl Into<String>) -> Self {
        self.failing_tables.insert(table.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Rows of `table` ordered by (tenant, natural key)
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock()
            .tables
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().tables.get(table).map_or(0, BTreeMap::len)
    }

    /// Every upsert call as (table, rows in the call)
    pub fn upsert_calls(&self) -> Vec<(String, usize)> {
        self.lock().upsert_calls.clone()
    }

    pub fn calls_for(&self, table: &str) -> usize {
        self.lock()
            .upsert_calls
            .iter()
            .filter(|(name, _)| name == table)
            .count()
    }

    pub fn recorded_runs(&self) -> Vec<RunReport> {
        self.lock().runs.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, table: &TableSpec, rows: &[Row]) -> Result<u64> {
        let mut inner = self.lock();
        inner.upsert_calls.push((table.name.to_string(), rows.len()));

        if self.failing_tables.contains(table.name) {
            return Err(IngestError::Store {
                table: table.name.to_string(),
                message: "simulated write failure".to_string(),
            });
        }

        let stored = inner.tables.entry(table.name.to_string()).or_default();
        let mut written = 0;
        for row in rows {
            let key = (column_text(row, TENANT_COLUMN), column_text(row, table.natural_key));
            let unchanged = stored
                .get(&key)
                .is_some_and(|existing| existing.get(CONTENT_HASH_COLUMN) == row.get(CONTENT_HASH_COLUMN));
            if !unchanged {
                stored.insert(key, row.clone());
                written += 1;
            }
        }

        Ok(written)
    }

    async fn record_run(&self, report: &RunReport) -> Result<()> {
        self.lock().runs.push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::normalize::LAST_SYNC_AT_COLUMN;
    use serde_json::json;

    const CONTACTS: TableSpec = TableSpec::new("3cx_contacts", "contact_id");

    fn row(tenant: &str, id: &str, hash: &str) -> Row {
        json!({ "tenant_id": tenant, "contact_id": id, "content_hash": hash })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryStore::new();
        let rows = vec![row("t1", "c1", "h1"), row("t1", "c2", "h2")];

        assert_eq!(store.upsert(&CONTACTS, &rows).await.unwrap(), 2);
        assert_eq!(store.upsert(&CONTACTS, &rows).await.unwrap(), 0);
        assert_eq!(store.row_count("3cx_contacts"), 2);
        assert_eq!(store.calls_for("3cx_contacts"), 2);
    }

    #[tokio::test]
    async fn test_changed_rows_overwrite() {
        let store = MemoryStore::new();
        store.upsert(&CONTACTS, &[row("t1", "c1", "h1")]).await.unwrap();
        let written = store.upsert(&CONTACTS, &[row("t1", "c1", "h2")]).await.unwrap();

        assert_eq!(written, 1);
        assert_eq!(store.rows("3cx_contacts")[0]["content_hash"], "h2");
    }

    #[tokio::test]
    async fn test_unchanged_rows_keep_last_sync_at() {
        let store = MemoryStore::new();
        let mut first = row("t1", "c1", "h1");
        first.insert(LAST_SYNC_AT_COLUMN.to_string(), json!("2026-01-01T00:00:00+00:00"));
        let mut rerun = row("t1", "c1", "h1");
        rerun.insert(LAST_SYNC_AT_COLUMN.to_string(), json!("2026-01-01T01:00:00+00:00"));

        store.upsert(&CONTACTS, &[first]).await.unwrap();
        assert_eq!(store.upsert(&CONTACTS, &[rerun]).await.unwrap(), 0);

        assert_eq!(store.rows("3cx_contacts")[0]["last_sync_at"], "2026-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_tenants_do_not_collide() {
        let store = MemoryStore::new();
        store
            .upsert(&CONTACTS, &[row("t1", "c1", "h1"), row("t2", "c1", "h1")])
            .await
            .unwrap();
        assert_eq!(store.row_count("3cx_contacts"), 2);
    }
}
