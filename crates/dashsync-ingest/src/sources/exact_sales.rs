//! Exact Sales ingestion (not built yet)

use super::{Capability, SourceConnector, SourceKind};
use crate::credential::Credential;
use crate::error::{IngestError, Result};
use crate::normalize::{SyncContext, TableBatch, TableSpec};
use async_trait::async_trait;

pub const LEADS_TABLE: TableSpec = TableSpec::new("exact_sales_leads", "lead_id");
pub const MEETINGS_TABLE: TableSpec = TableSpec::new("exact_sales_meetings", "meeting_id");

pub struct ExactSalesConnector;

#[async_trait]
impl SourceConnector for ExactSalesConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::ExactSales
    }

    fn capability(&self) -> Capability {
        Capability::NotImplemented
    }

    fn tables(&self) -> Vec<TableSpec> {
        vec![LEADS_TABLE, MEETINGS_TABLE]
    }

    async fn extract(&self, _credential: &Credential, _ctx: &SyncContext) -> Result<Vec<TableBatch>> {
        Err(IngestError::NotImplemented {
            integration: self.kind(),
        })
    }
}
