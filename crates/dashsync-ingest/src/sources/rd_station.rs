//! RD Station ingestion
//!
//! RD Station exposes two products with separate APIs:
//! - **CRM**: deals and contacts
//! - **Marketing**: leads
//!
//! Only the destination tables are declared for now.

use super::{Capability, SourceConnector, SourceKind};
use crate::credential::Credential;
use crate::error::{IngestError, Result};
use crate::normalize::{SyncContext, TableBatch, TableSpec};
use async_trait::async_trait;

pub const CRM_DEALS_TABLE: TableSpec = TableSpec::new("rd_crm_deals", "rd_deal_id");
pub const CRM_CONTACTS_TABLE: TableSpec = TableSpec::new("rd_crm_contacts", "rd_contact_id");
pub const MARKETING_LEADS_TABLE: TableSpec = TableSpec::new("rd_marketing_leads", "rd_lead_id");

pub struct RdStationConnector;

#[async_trait]
impl SourceConnector for RdStationConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::RdStation
    }

    fn capability(&self) -> Capability {
        Capability::NotImplemented
    }

    fn tables(&self) -> Vec<TableSpec> {
        vec![CRM_DEALS_TABLE, CRM_CONTACTS_TABLE, MARKETING_LEADS_TABLE]
    }

    async fn extract(&self, _credential: &Credential, _ctx: &SyncContext) -> Result<Vec<TableBatch>> {
        Err(IngestError::NotImplemented {
            integration: self.kind(),
        })
    }
}
