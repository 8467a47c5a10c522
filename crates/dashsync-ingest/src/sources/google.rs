//! Google Analytics and Google Ads ingestion (not built yet)

use super::{Capability, SourceConnector, SourceKind};
use crate::credential::Credential;
use crate::error::{IngestError, Result};
use crate::normalize::{SyncContext, TableBatch, TableSpec};
use async_trait::async_trait;

pub const ANALYTICS_METRICS_TABLE: TableSpec = TableSpec::new("google_analytics_metrics", "metric_id");
pub const ADS_CAMPAIGNS_TABLE: TableSpec = TableSpec::new("google_ads_campaigns", "campaign_id");

pub struct GoogleConnector;

#[async_trait]
impl SourceConnector for GoogleConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Google
    }

    fn capability(&self) -> Capability {
        Capability::NotImplemented
    }

    fn tables(&self) -> Vec<TableSpec> {
        vec![ANALYTICS_METRICS_TABLE, ADS_CAMPAIGNS_TABLE]
    }

    async fn extract(&self, _credential: &Credential, _ctx: &SyncContext) -> Result<Vec<TableBatch>> {
        Err(IngestError::NotImplemented {
            integration: self.kind(),
        })
    }
}
