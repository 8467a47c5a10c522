//! Typed results of an ETL run

use crate::normalize::TableSpec;
use crate::sources::SourceKind;
use chrono::{DateTime, Utc};
use dashsync_common::types::TenantId;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Skipped,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Skipped => "skipped",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase a run was in when it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Checks done before any I/O (credential, capability)
    Preflight,
    Fetching,
    Loading,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Preflight => "preflight",
            Stage::Fetching => "fetching",
            Stage::Loading => "loading",
        }
    }
}

/// What happened to one destination table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TableOutcome {
    /// One upsert carried `rows`; `written` rows actually changed
    Loaded { rows: usize, written: u64 },
    /// Nothing to write, the store was not called
    Empty,
    Failed { error: String },
    /// An earlier table failed first
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub natural_key: String,
    #[serde(flatten)]
    pub outcome: TableOutcome,
    /// Records dropped during normalization
    pub rejected: usize,
}

impl TableReport {
    pub fn new(table: &TableSpec, outcome: TableOutcome, rejected: usize) -> Self {
        Self {
            table: table.name.to_string(),
            natural_key: table.natural_key.to_string(),
            outcome,
            rejected,
        }
    }
}

/// Result of running one source for one tenant
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub source: SourceKind,
    pub tenant_id: TenantId,
    pub status: RunStatus,
    /// Set when the run failed
    pub stage: Option<Stage>,
    pub error: Option<String>,
    pub tables: Vec<TableReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Rows handed to the store across all loaded tables
    pub fn rows_loaded(&self) -> usize {
        self.tables
            .iter()
            .map(|t| match t.outcome {
                TableOutcome::Loaded { rows, .. } => rows,
                _ => 0,
            })
            .sum()
    }
}
