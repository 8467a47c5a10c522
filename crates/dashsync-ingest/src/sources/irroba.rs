//! Irroba e-commerce ingestion
//!
//! Orders and customers tables are declared; extraction is not built yet.

use super::{Capability, SourceConnector, SourceKind};
use crate::credential::Credential;
use crate::error::{IngestError, Result};
use crate::normalize::{SyncContext, TableBatch, TableSpec};
use async_trait::async_trait;

pub const ORDERS_TABLE: TableSpec = TableSpec::new("irroba_orders", "order_id");
pub const CUSTOMERS_TABLE: TableSpec = TableSpec::new("irroba_customers", "customer_id");

pub struct IrrobaConnector;

#[async_trait]
impl SourceConnector for IrrobaConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Irroba
    }

    fn capability(&self) -> Capability {
        Capability::NotImplemented
    }

    fn tables(&self) -> Vec<TableSpec> {
        vec![ORDERS_TABLE, CUSTOMERS_TABLE]
    }

    async fn extract(&self, _credential: &Credential, _ctx: &SyncContext) -> Result<Vec<TableBatch>> {
        Err(IngestError::NotImplemented {
            integration: self.kind(),
        })
    }
}
