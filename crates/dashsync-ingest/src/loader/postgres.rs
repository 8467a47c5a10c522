//! Direct Postgres store
//!
//! Each batch is one `INSERT .. SELECT FROM jsonb_populate_recordset(..)`
//! statement inside a transaction, so a table is either fully written or
//! untouched. Rows whose `content_hash` did not change are left alone.

use super::{columns_of, quote_ident, RecordStore};
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::normalize::{Row, TableSpec, CONTENT_HASH_COLUMN};
use crate::report::{RunReport, RunStatus};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::Duration;
use tracing::info;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;

        info!(max_connections = config.max_connections, "Database connection pool created");

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Build the upsert statement for `table` covering `columns`
pub(crate) fn upsert_sql(table: &TableSpec, columns: &[String]) -> String {
    let table_ident = quote_ident(table.name);
    let conflict = table.conflict_columns();

    let column_list = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");

    let mut assignments: Vec<String> = columns
        .iter()
        .filter(|c| !conflict.contains(&c.as_str()))
        .map(|c| format!("{col} = EXCLUDED.{col}", col = quote_ident(c)))
        .collect();
    assignments.push("\"updated_at\" = NOW()".to_string());

    format!(
        "INSERT INTO {table} ({columns}) \
         SELECT {columns} FROM jsonb_populate_recordset(NULL::{table}, $1) \
         ON CONFLICT ({conflict}) DO UPDATE SET {assignments} \
         WHERE {table}.{hash} IS DISTINCT FROM EXCLUDED.{hash}",
        table = table_ident,
        columns = column_list,
        conflict = conflict.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", "),
        assignments = assignments.join(", "),
        hash = quote_ident(CONTENT_HASH_COLUMN),
    )
}

#[async_trait]
impl RecordStore for PostgresStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn upsert(&self, table: &TableSpec, rows: &[Row]) -> Result<u64> {
        let sql = upsert_sql(table, &columns_of(rows));

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql).bind(Json(rows)).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn record_run(&self, report: &RunReport) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO etl_runs (
                run_id, tenant_id, source, status, stage, error, tables, started_at, finished_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (run_id) DO NOTHING
            "#,
        )
        .bind(report.run_id)
        .bind(report.tenant_id.as_uuid())
        .bind(report.source.as_str())
        .bind(report.status.as_str())
        .bind(report.stage.map(|s| s.as_str()))
        .bind(report.error.as_deref())
        .bind(Json(&report.tables))
        .bind(report.started_at)
        .bind(report.finished_at)
        .execute(&mut *tx)
        .await?;

        let succeeded_at = (report.status == RunStatus::Completed).then_some(report.finished_at);

        sqlx::query(
            r#"
            INSERT INTO etl_source_status (
                tenant_id, source, last_run_id, last_status, last_error, last_run_at, last_success_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tenant_id, source) DO UPDATE SET
                last_run_id = EXCLUDED.last_run_id,
                last_status = EXCLUDED.last_status,
                last_error = EXCLUDED.last_error,
                last_run_at = EXCLUDED.last_run_at,
                last_success_at = COALESCE(EXCLUDED.last_success_at, etl_source_status.last_success_at)
            "#,
        )
        .bind(report.tenant_id.as_uuid())
        .bind(report.source.as_str())
        .bind(report.run_id)
        .bind(report.status.as_str())
        .bind(report.error.as_deref())
        .bind(report.finished_at)
        .bind(succeeded_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_batch, SyncContext};
    use crate::report::Stage;
    use crate::sources::SourceKind;
    use chrono::{DateTime, Utc};
    use dashsync_common::types::TenantId;
    use serde_json::{json, Value};
    use uuid::Uuid;

    const CONTACTS: TableSpec = TableSpec::new("3cx_contacts", "contact_id");

    fn contacts(ctx: &SyncContext, records: Vec<Value>) -> Vec<Row> {
        normalize_batch(CONTACTS, records, ctx).unwrap().rows
    }

    /// A context for the same tenant whose sync started an hour later
    fn later(ctx: &SyncContext) -> SyncContext {
        SyncContext {
            run_id: Uuid::new_v4(),
            tenant_id: ctx.tenant_id,
            started_at: ctx.started_at + chrono::Duration::hours(1),
        }
    }

    async fn contact_row(pool: &PgPool, tenant: TenantId, id: &str) -> sqlx::Result<(String, DateTime<Utc>)> {
        sqlx::query_as(
            r#"SELECT first_name, last_sync_at FROM "3cx_contacts" WHERE tenant_id = $1 AND contact_id = $2"#,
        )
        .bind(tenant.as_uuid())
        .bind(id)
        .fetch_one(pool)
        .await
    }

    async fn contact_count(pool: &PgPool) -> sqlx::Result<i64> {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM "3cx_contacts""#)
            .fetch_one(pool)
            .await
    }

    fn report(tenant: TenantId, status: RunStatus) -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: Uuid::new_v4(),
            source: SourceKind::ThreeCx,
            tenant_id: tenant,
            status,
            stage: (status == RunStatus::Failed).then_some(Stage::Fetching),
            error: (status == RunStatus::Failed).then(|| "Upstream error from 3cx contacts".to_string()),
            tables: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    async fn last_success_at(pool: &PgPool, tenant: TenantId) -> sqlx::Result<(String, Option<DateTime<Utc>>)> {
        sqlx::query_as(
            "SELECT last_status, last_success_at FROM etl_source_status WHERE tenant_id = $1 AND source = $2",
        )
        .bind(tenant.as_uuid())
        .bind(SourceKind::ThreeCx.as_str())
        .fetch_one(pool)
        .await
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_upsert_same_batch_twice_writes_once(pool: PgPool) -> sqlx::Result<()> {
        let store = PostgresStore::new(pool.clone());
        let ctx = SyncContext::new(TenantId::new(Uuid::new_v4()));
        let rows = contacts(
            &ctx,
            vec![
                json!({ "contact_id": "c1", "first_name": "Ada" }),
                json!({ "contact_id": "c2", "first_name": "Grace" }),
            ],
        );

        assert_eq!(store.upsert(&CONTACTS, &rows).await.unwrap(), 2);
        let (_, first_sync) = contact_row(&pool, ctx.tenant_id, "c1").await?;

        let rerun = later(&ctx);
        let rows = contacts(
            &rerun,
            vec![
                json!({ "contact_id": "c1", "first_name": "Ada" }),
                json!({ "contact_id": "c2", "first_name": "Grace" }),
            ],
        );
        assert_eq!(store.upsert(&CONTACTS, &rows).await.unwrap(), 0);

        assert_eq!(contact_count(&pool).await?, 2);
        let (name, last_sync) = contact_row(&pool, ctx.tenant_id, "c1").await?;
        assert_eq!(name, "Ada");
        // Unchanged rows keep the time of the sync that last changed them
        assert_eq!(last_sync, first_sync);

        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_changed_row_is_overwritten(pool: PgPool) -> sqlx::Result<()> {
        let store = PostgresStore::new(pool.clone());
        let ctx = SyncContext::new(TenantId::new(Uuid::new_v4()));
        store
            .upsert(&CONTACTS, &contacts(&ctx, vec![json!({ "contact_id": "c1", "first_name": "Ada" })]))
            .await
            .unwrap();
        let (_, first_sync) = contact_row(&pool, ctx.tenant_id, "c1").await?;

        let rerun = later(&ctx);
        let written = store
            .upsert(&CONTACTS, &contacts(&rerun, vec![json!({ "contact_id": "c1", "first_name": "Augusta" })]))
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert_eq!(contact_count(&pool).await?, 1);
        let (name, last_sync) = contact_row(&pool, ctx.tenant_id, "c1").await?;
        assert_eq!(name, "Augusta");
        assert!(last_sync > first_sync);

        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_tenants_with_same_key_do_not_collide(pool: PgPool) -> sqlx::Result<()> {
        let store = PostgresStore::new(pool.clone());
        for _ in 0..2 {
            let ctx = SyncContext::new(TenantId::new(Uuid::new_v4()));
            let rows = contacts(&ctx, vec![json!({ "contact_id": "c1", "first_name": "Ada" })]);
            assert_eq!(store.upsert(&CONTACTS, &rows).await.unwrap(), 1);
        }

        assert_eq!(contact_count(&pool).await?, 2);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_record_run_sets_last_success_only_when_completed(pool: PgPool) -> sqlx::Result<()> {
        let store = PostgresStore::new(pool.clone());
        let tenant = TenantId::new(Uuid::new_v4());

        let completed = report(tenant, RunStatus::Completed);
        store.record_run(&completed).await.unwrap();
        let (status, success) = last_success_at(&pool, tenant).await?;
        assert_eq!(status, "completed");
        let success = success.expect("completed run sets last_success_at");

        store.record_run(&report(tenant, RunStatus::Failed)).await.unwrap();
        let (status, after_failure) = last_success_at(&pool, tenant).await?;
        assert_eq!(status, "failed");
        assert_eq!(after_failure, Some(success));

        let never_succeeded = TenantId::new(Uuid::new_v4());
        store.record_run(&report(never_succeeded, RunStatus::Failed)).await.unwrap();
        let (_, success) = last_success_at(&pool, never_succeeded).await?;
        assert!(success.is_none());

        let runs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM etl_runs").fetch_one(&pool).await?;
        assert_eq!(runs, 3);

        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_record_run_is_idempotent_per_run_id(pool: PgPool) -> sqlx::Result<()> {
        let store = PostgresStore::new(pool.clone());
        let run = report(TenantId::new(Uuid::new_v4()), RunStatus::Completed);

        store.record_run(&run).await.unwrap();
        store.record_run(&run).await.unwrap();

        let runs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM etl_runs WHERE run_id = $1")
            .bind(run.run_id)
            .fetch_one(&pool)
            .await?;
        assert_eq!(runs, 1);
        Ok(())
    }

    #[test]
    fn test_upsert_sql_shape() {
        let table = TableSpec::new("3cx_call_records", "call_id");
        let columns: Vec<String> = ["call_id", "content_hash", "status", "tenant_id"]
            .iter()
            .map(|c| c.to_string())
            .collect();

        let sql = upsert_sql(&table, &columns);

        assert!(sql.starts_with("INSERT INTO \"3cx_call_records\" (\"call_id\", \"content_hash\", \"status\", \"tenant_id\")"));
        assert!(sql.contains("jsonb_populate_recordset(NULL::\"3cx_call_records\", $1)"));
        assert!(sql.contains("ON CONFLICT (\"tenant_id\", \"call_id\")"));
        assert!(sql.contains("\"status\" = EXCLUDED.\"status\""));
        assert!(!sql.contains("\"call_id\" = EXCLUDED"));
        assert!(!sql.contains("\"tenant_id\" = EXCLUDED"));
        assert!(sql.ends_with(
            "WHERE \"3cx_call_records\".\"content_hash\" IS DISTINCT FROM EXCLUDED.\"content_hash\""
        ));
    }
}
