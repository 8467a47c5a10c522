//! Trigger interface for external schedulers
//!
//! A cron job or webhook describes what to sync with a [`SyncRequest`]:
//!
//! ```json
//! { "tenant_id": "7b0c1d8e-3f4a-4c5b-9d6e-0f1a2b3c4d5e", "sources": ["3cx", "meta"] }
//! ```
//!
//! An empty or missing `sources` list means every implemented source.
//! Sources run one after another and each produces its own [`RunReport`].

use crate::credential::Credentials;
use crate::error::{IngestError, Result};
use crate::loader::RecordStore;
use crate::orchestrator::EtlOrchestrator;
use crate::report::RunReport;
use crate::sources::{SourceKind, SourceRegistry};
use dashsync_common::types::TenantId;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncRequest {
    /// Falls back to the configured default tenant
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub sources: Vec<SourceKind>,
}

impl SyncRequest {
    pub fn new(tenant_id: Option<TenantId>, sources: Vec<SourceKind>) -> Self {
        Self { tenant_id, sources }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Runs [`SyncRequest`]s against a registry, credentials and a store
pub struct Dispatcher {
    registry: SourceRegistry,
    credentials: Credentials,
    orchestrator: EtlOrchestrator,
    default_tenant: Option<TenantId>,
}

impl Dispatcher {
    pub fn new(registry: SourceRegistry, credentials: Credentials, store: Arc<dyn RecordStore>) -> Self {
        Self {
            registry,
            credentials,
            orchestrator: EtlOrchestrator::new(store),
            default_tenant: None,
        }
    }

    pub fn with_default_tenant(mut self, tenant_id: Option<TenantId>) -> Self {
        self.default_tenant = tenant_id;
        self
    }

    /// Run every requested source in order
    ///
    /// Only request-level problems (no tenant, unregistered source) are
    /// returned as errors; run failures are reported per source.
    pub async fn dispatch(&self, request: &SyncRequest) -> Result<Vec<RunReport>> {
        let tenant_id = request.tenant_id.or(self.default_tenant).ok_or_else(|| {
            IngestError::Config(
                "No tenant given: pass tenant_id in the request or set DASHSYNC_TENANT_ID".to_string(),
            )
        })?;

        let kinds = if request.sources.is_empty() {
            self.registry.implemented()
        } else {
            request.sources.clone()
        };

        let mut connectors = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let connector = self
                .registry
                .get(kind)
                .ok_or_else(|| IngestError::Config(format!("Source {} is not registered", kind)))?;
            connectors.push(connector);
        }

        info!(tenant = %tenant_id, sources = connectors.len(), "Dispatching sync request");

        let mut reports = Vec::with_capacity(connectors.len());
        for connector in connectors {
            let credential = self.credentials.get(connector.kind());
            reports.push(self.orchestrator.run(connector.as_ref(), credential, tenant_id).await);
        }

        Ok(reports)
    }
}
