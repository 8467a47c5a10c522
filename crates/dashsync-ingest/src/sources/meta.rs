//! Meta Ads ingestion
//!
//! Declares the Meta tables so runs can be reported, but extraction is not
//! built yet.

use super::{Capability, SourceConnector, SourceKind};
use crate::credential::Credential;
use crate::error::{IngestError, Result};
use crate::normalize::{SyncContext, TableBatch, TableSpec};
use async_trait::async_trait;

pub const ADS_INSIGHTS_TABLE: TableSpec = TableSpec::new("meta_ads_insights", "insight_id");
pub const CAMPAIGNS_TABLE: TableSpec = TableSpec::new("meta_campaigns", "campaign_id");

pub struct MetaConnector;

#[async_trait]
impl SourceConnector for MetaConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Meta
    }

    fn capability(&self) -> Capability {
        Capability::NotImplemented
    }

    fn tables(&self) -> Vec<TableSpec> {
        vec![ADS_INSIGHTS_TABLE, CAMPAIGNS_TABLE]
    }

    async fn extract(&self, _credential: &Credential, _ctx: &SyncContext) -> Result<Vec<TableBatch>> {
        Err(IngestError::NotImplemented {
            integration: self.kind(),
        })
    }
}
