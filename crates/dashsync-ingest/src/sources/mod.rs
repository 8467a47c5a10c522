//! Platform connectors
//!
//! Each integration implements [`SourceConnector`]: it declares the tables it
//! feeds and, when implemented, extracts and normalizes platform records into
//! [`TableBatch`]es. Integrations that are not built yet declare
//! [`Capability::NotImplemented`] so runs can be reported as skipped instead
//! of succeeding with zero rows.
//!
//! - **threecx**: 3CX phone system (call records, contacts, extensions)
//! - **meta**, **google**, **rd_station**, **exact_sales**, **irroba**: declared only

pub mod exact_sales;
pub mod google;
pub mod irroba;
pub mod meta;
pub mod rd_station;
pub mod threecx;

use crate::config::IngestConfig;
use crate::credential::Credential;
use crate::error::{IngestError, Result};
use crate::http::ApiClient;
use crate::normalize::{SyncContext, TableBatch, TableSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Known integrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "3cx", alias = "threecx")]
    ThreeCx,
    #[serde(rename = "meta")]
    Meta,
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "rd_station", alias = "rdstation")]
    RdStation,
    #[serde(rename = "exact_sales", alias = "exactsales")]
    ExactSales,
    #[serde(rename = "irroba")]
    Irroba,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::ThreeCx,
        SourceKind::Meta,
        SourceKind::Google,
        SourceKind::RdStation,
        SourceKind::ExactSales,
        SourceKind::Irroba,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::ThreeCx => "3cx",
            SourceKind::Meta => "meta",
            SourceKind::Google => "google",
            SourceKind::RdStation => "rd_station",
            SourceKind::ExactSales => "exact_sales",
            SourceKind::Irroba => "irroba",
        }
    }

    fn env_name(&self) -> &'static str {
        match self {
            SourceKind::ThreeCx => "THREECX",
            SourceKind::Meta => "META",
            SourceKind::Google => "GOOGLE",
            SourceKind::RdStation => "RD_STATION",
            SourceKind::ExactSales => "EXACT_SALES",
            SourceKind::Irroba => "IRROBA",
        }
    }

    /// Environment variable holding this source's bearer token
    pub fn credential_env_var(&self) -> String {
        format!("DASHSYNC_{}_TOKEN", self.env_name())
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = IngestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "3cx" | "threecx" => Ok(SourceKind::ThreeCx),
            "meta" => Ok(SourceKind::Meta),
            "google" => Ok(SourceKind::Google),
            "rd_station" | "rdstation" => Ok(SourceKind::RdStation),
            "exact_sales" | "exactsales" => Ok(SourceKind::ExactSales),
            "irroba" => Ok(SourceKind::Irroba),
            _ => Err(IngestError::Config(format!(
                "Unknown source '{}'. Expected one of: 3cx, meta, google, rd_station, exact_sales, irroba",
                s
            ))),
        }
    }
}

/// Whether a connector can actually extract data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Implemented,
    NotImplemented,
}

/// Extract + normalize for one integration
#[async_trait]
pub trait SourceConnector: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn capability(&self) -> Capability {
        Capability::Implemented
    }

    /// Destination tables in load order
    fn tables(&self) -> Vec<TableSpec>;

    /// Fetch every endpoint and return one batch per destination table
    async fn extract(&self, credential: &Credential, ctx: &SyncContext) -> Result<Vec<TableBatch>>;
}

/// All connectors available to a process
#[derive(Clone, Default)]
pub struct SourceRegistry {
    connectors: Vec<Arc<dyn SourceConnector>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every integration using the process configuration
    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        let api = ApiClient::new(config.http.clone())?;

        let mut registry = Self::new();
        if let Some(base_url) = &config.threecx.base_url {
            registry.register(Arc::new(threecx::ThreeCxConnector::new(api, base_url.clone())));
        } else {
            registry.register(Arc::new(threecx::ThreeCxConnector::unconfigured()));
        }
        registry.register(Arc::new(meta::MetaConnector));
        registry.register(Arc::new(google::GoogleConnector));
        registry.register(Arc::new(rd_station::RdStationConnector));
        registry.register(Arc::new(exact_sales::ExactSalesConnector));
        registry.register(Arc::new(irroba::IrrobaConnector));

        Ok(registry)
    }

    /// Add a connector, replacing any previous one of the same kind
    pub fn register(&mut self, connector: Arc<dyn SourceConnector>) {
        self.connectors.retain(|existing| existing.kind() != connector.kind());
        self.connectors.push(connector);
    }

    pub fn get(&self, kind: SourceKind) -> Option<Arc<dyn SourceConnector>> {
        self.connectors
            .iter()
            .find(|connector| connector.kind() == kind)
            .cloned()
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn SourceConnector>> {
        self.connectors.iter()
    }

    pub fn implemented(&self) -> Vec<SourceKind> {
        self.connectors
            .iter()
            .filter(|connector| connector.capability() == Capability::Implemented)
            .map(|connector| connector.kind())
            .collect()
    }
}
