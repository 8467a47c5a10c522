//! 3CX REST client
//!
//! Every listing endpoint uses the same `{ list, nextPage }` envelope, so the
//! client is a thin layer over [`fetch_all_pages`].

use super::models::{RawCallRecord, RawContact, RawExtension};
use crate::credential::Credential;
use crate::error::Result;
use crate::http::{fetch_all_pages, resolve_against_base, ApiClient};
use serde::de::DeserializeOwned;
use tracing::info;
use url::Url;

/// Listing endpoints exposed by the 3CX API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CallRecords,
    Contacts,
    Extensions,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::CallRecords => "/api/call-records",
            Endpoint::Contacts => "/api/contacts",
            Endpoint::Extensions => "/api/extensions",
        }
    }

    /// Label used in errors and logs
    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::CallRecords => "3cx call-records",
            Endpoint::Contacts => "3cx contacts",
            Endpoint::Extensions => "3cx extensions",
        }
    }
}

/// Everything one 3CX run pulls, in memory
#[derive(Debug, Default)]
pub struct ThreeCxExtract {
    pub call_records: Vec<RawCallRecord>,
    pub contacts: Vec<RawContact>,
    pub extensions: Vec<RawExtension>,
}

/// Client for one 3CX instance
#[derive(Debug, Clone)]
pub struct ThreeCxClient {
    api: ApiClient,
    base_url: Url,
}

impl ThreeCxClient {
    pub fn new(api: ApiClient, base_url: Url) -> Self {
        Self { api, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch every page of `endpoint`, below the base URL's path
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        credential: &Credential,
    ) -> Result<Vec<T>> {
        let first = resolve_against_base(&self.base_url, endpoint.path())?;
        let records =
            fetch_all_pages(&self.api, endpoint.label(), &self.base_url, first, credential).await?;
        info!(endpoint = endpoint.label(), records = records.len(), "Fetched 3CX endpoint");
        Ok(records)
    }

    /// Fetch all endpoints concurrently; the first failure abandons the rest
    pub async fn fetch_all(&self, credential: &Credential) -> Result<ThreeCxExtract> {
        let (call_records, contacts, extensions) = futures::try_join!(
            self.fetch::<RawCallRecord>(Endpoint::CallRecords, credential),
            self.fetch::<RawContact>(Endpoint::Contacts, credential),
            self.fetch::<RawExtension>(Endpoint::Extensions, credential),
        )?;

        Ok(ThreeCxExtract {
            call_records,
            contacts,
            extensions,
        })
    }
}
