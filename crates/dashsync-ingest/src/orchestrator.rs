//! ETL run orchestration
//!
//! A run for one source and one tenant moves through
//! `Preflight -> Fetching -> Loading` and ends `Completed`, `Skipped` or
//! `Failed`. Fetching happens completely before anything is written, so a
//! fetch failure leaves the store untouched. Tables are then loaded one at a
//! time; the first failing table stops the run and the remaining tables are
//! reported as not attempted. Tables written before the failure stay written.

use crate::credential::Credential;
use crate::error::IngestError;
use crate::loader::{Loader, RecordStore};
use crate::normalize::{SyncContext, TableBatch};
use crate::report::{RunReport, RunStatus, Stage, TableOutcome, TableReport};
use crate::sources::{Capability, SourceConnector, SourceKind};
use chrono::Utc;
use dashsync_common::types::TenantId;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub struct EtlOrchestrator {
    loader: Loader,
}

/// Accumulates the pieces of a [`RunReport`] while a run progresses
struct RunState {
    ctx: SyncContext,
    source: SourceKind,
    tables: Vec<TableReport>,
}

impl RunState {
    fn finish(self, status: RunStatus, stage: Option<Stage>, error: Option<String>) -> RunReport {
        RunReport {
            run_id: self.ctx.run_id,
            source: self.source,
            tenant_id: self.ctx.tenant_id,
            status,
            stage,
            error,
            tables: self.tables,
            started_at: self.ctx.started_at,
            finished_at: Utc::now(),
        }
    }

    fn fail(self, stage: Stage, err: &IngestError) -> RunReport {
        self.finish(RunStatus::Failed, Some(stage), Some(err.to_string()))
    }
}

impl EtlOrchestrator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            loader: Loader::new(store),
        }
    }

    /// Run one source for one tenant
    ///
    /// Never returns an error: every failure is captured in the report.
    #[instrument(skip_all, fields(source = %connector.kind(), tenant = %tenant_id))]
    pub async fn run(
        &self,
        connector: &dyn SourceConnector,
        credential: Option<&Credential>,
        tenant_id: TenantId,
    ) -> RunReport {
        let state = RunState {
            ctx: SyncContext::new(tenant_id),
            source: connector.kind(),
            tables: Vec::new(),
        };
        info!(run_id = %state.ctx.run_id, "Starting ETL run");

        let Some(credential) = credential else {
            let err = IngestError::MissingCredential {
                integration: connector.kind(),
            };
            error!(error = %err, "Run failed before fetching");
            return state.fail(Stage::Preflight, &err);
        };

        if connector.capability() == Capability::NotImplemented {
            info!("Source is not implemented yet, skipping");
            let err = IngestError::NotImplemented {
                integration: connector.kind(),
            };
            return state.finish(RunStatus::Skipped, None, Some(err.to_string()));
        }

        let report = match connector.extract(credential, &state.ctx).await {
            Ok(batches) => self.load(state, batches).await,
            Err(err) => {
                error!(error = %err, "Fetch failed, nothing was written");
                state.fail(Stage::Fetching, &err)
            },
        };

        if let Err(err) = self.loader.store().record_run(&report).await {
            warn!(error = %err, "Failed to record run in the ledger");
        }

        info!(
            status = %report.status,
            rows = report.rows_loaded(),
            tables = report.tables.len(),
            "ETL run finished"
        );
        report
    }

    async fn load(&self, mut state: RunState, batches: Vec<TableBatch>) -> RunReport {
        let mut failure: Option<IngestError> = None;

        for batch in &batches {
            if failure.is_some() {
                state
                    .tables
                    .push(TableReport::new(&batch.table, TableOutcome::NotAttempted, batch.rejected));
                continue;
            }

            let outcome = match self.loader.load(batch).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(table = batch.table.name, error = %err, "Load failed, stopping run");
                    let outcome = TableOutcome::Failed {
                        error: err.to_string(),
                    };
                    failure = Some(err);
                    outcome
                },
            };
            state
                .tables
                .push(TableReport::new(&batch.table, outcome, batch.rejected));
        }

        match failure {
            Some(err) => state.fail(Stage::Loading, &err),
            None => state.finish(RunStatus::Completed, None, None),
        }
    }
}
