//! Supabase (PostgREST) store
//!
//! Upserts go through `POST /rest/v1/<table>?on_conflict=tenant_id,<key>`
//! with `Prefer: resolution=merge-duplicates`. PostgREST applies the whole
//! request body in one statement, so a batch is still all-or-nothing.

use super::RecordStore;
use crate::credential::Credential;
use crate::error::{IngestError, Result};
use crate::http::{DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::normalize::{Row, TableSpec};
use crate::report::RunReport;
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::Serialize;
use std::time::Duration;
use url::Url;

const RUNS_TABLE: &str = "etl_runs";

pub struct SupabaseStore {
    client: Client,
    base_url: Url,
    service_key: Credential,
}

impl SupabaseStore {
    pub fn new(base_url: Url, service_key: Credential) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            service_key,
        })
    }

    /// `<base>/rest/v1/<table>?on_conflict=<columns>`
    fn table_url(&self, table: &str, on_conflict: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IngestError::Config(format!("SUPABASE_URL {} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["rest", "v1", table]);
        url.query_pairs_mut().append_pair("on_conflict", on_conflict);
        Ok(url)
    }

    async fn post<T: Serialize + ?Sized>(&self, url: Url, prefer: &str, body: &T) -> Result<Response> {
        let response = self
            .client
            .post(url)
            .header("apikey", self.service_key.expose())
            .header(header::AUTHORIZATION, self.service_key.bearer())
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

/// Turn a PostgREST error response into a table-attributed error
async fn check(table: &str, response: Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(IngestError::Store {
        table: table.to_string(),
        message: format!(
            "{} {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status"),
            body.trim()
        ),
    })
}

#[async_trait]
impl RecordStore for SupabaseStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn upsert(&self, table: &TableSpec, rows: &[Row]) -> Result<u64> {
        let url = self.table_url(table.name, &table.conflict_columns().join(","))?;
        let response = self
            .post(url, "resolution=merge-duplicates,return=minimal", rows)
            .await?;
        check(table.name, response).await?;

        // PostgREST does not report which merged rows actually changed
        Ok(rows.len() as u64)
    }

    async fn record_run(&self, report: &RunReport) -> Result<()> {
        let url = self.table_url(RUNS_TABLE, "run_id")?;
        let response = self
            .post(url, "resolution=ignore-duplicates,return=minimal", report)
            .await?;
        check(RUNS_TABLE, response).await
    }
}
