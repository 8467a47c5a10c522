//! Cursor pagination over `{ list, nextPage }` responses
//!
//! The server returns one page of records plus a pointer to the next page.
//! Pages are fetched strictly one after another and concatenated in the
//! order the server returned them; the walk stops when the pointer is null,
//! absent or blank.

use super::ApiClient;
use crate::credential::Credential;
use crate::error::{IngestError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// One page of a paginated listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,

    #[serde(default)]
    pub next_page: Option<String>,
}

impl<T> Page<T> {
    fn next_pointer(&self) -> Option<&str> {
        self.next_page
            .as_deref()
            .map(str::trim)
            .filter(|pointer| !pointer.is_empty())
    }
}

/// Resolve an endpoint path or page pointer under `base`
///
/// Absolute URLs are taken as they are. Anything else lands below the base
/// URL's own path, so `https://host/pbx` plus `/api/contacts` gives
/// `https://host/pbx/api/contacts`. A pointer that already carries the base
/// path is not prefixed twice.
pub fn resolve_against_base(base: &Url, reference: &str) -> Result<Url> {
    if let Ok(absolute) = Url::parse(reference) {
        return Ok(absolute);
    }

    let mut dir = base.clone();
    if !dir.path().ends_with('/') {
        let path = format!("{}/", dir.path());
        dir.set_path(&path);
    }

    let relative = match reference.strip_prefix(dir.path()) {
        Some(rest) => rest,
        None => reference.trim_start_matches('/'),
    };
    Ok(dir.join(relative)?)
}

/// Follow `nextPage` pointers from `first` until exhausted
///
/// Relative pointers are resolved with [`resolve_against_base`]. Any failing
/// page aborts the whole walk; records already collected are dropped with it.
pub async fn fetch_all_pages<T: DeserializeOwned>(
    api: &ApiClient,
    endpoint: &str,
    base: &Url,
    first: Url,
    credential: &Credential,
) -> Result<Vec<T>> {
    let max_pages = api.config().max_pages;
    let mut records = Vec::new();
    let mut url = first;
    let mut pages = 0usize;

    loop {
        if pages == max_pages {
            return Err(IngestError::PaginationLimit {
                endpoint: endpoint.to_string(),
                max_pages,
            });
        }

        let page: Page<T> = api.get_json(endpoint, &url, credential).await?;
        pages += 1;

        let next = page
            .next_pointer()
            .map(|pointer| resolve_against_base(base, pointer))
            .transpose()?;
        debug!(endpoint, page = pages, records = page.list.len(), has_next = next.is_some(), "Fetched page");
        records.extend(page.list);

        match next {
            Some(next_url) => url = next_url,
            None => break,
        }
    }

    debug!(endpoint, pages, total = records.len(), "Pagination complete");
    Ok(records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_decodes_camel_case() {
        let page: Page<serde_json::Value> =
            serde_json::from_str(r#"{"list":[{"a":1}],"nextPage":"/api/x?page=2"}"#).unwrap();
        assert_eq!(page.list.len(), 1);
        assert_eq!(page.next_pointer(), Some("/api/x?page=2"));
    }

    #[test]
    fn test_missing_or_blank_pointer_ends_walk() {
        let page: Page<serde_json::Value> = serde_json::from_str(r#"{"list":[]}"#).unwrap();
        assert_eq!(page.next_pointer(), None);

        let page: Page<serde_json::Value> =
            serde_json::from_str(r#"{"list":[],"nextPage":null}"#).unwrap();
        assert_eq!(page.next_pointer(), None);

        let page: Page<serde_json::Value> =
            serde_json::from_str(r#"{"list":[],"nextPage":"  "}"#).unwrap();
        assert_eq!(page.next_pointer(), None);
    }

    #[test]
    fn test_relative_pointer_resolution() {
        let base = Url::parse("https://pbx.example.com").unwrap();
        assert_eq!(
            resolve_against_base(&base, "/api/call-records?cursor=abc").unwrap().as_str(),
            "https://pbx.example.com/api/call-records?cursor=abc"
        );
        assert_eq!(
            resolve_against_base(&base, "https://other.example.com/p2").unwrap().as_str(),
            "https://other.example.com/p2"
        );
    }

    #[test]
    fn test_resolution_keeps_base_path() {
        for base in ["https://host.example.com/pbx", "https://host.example.com/pbx/"] {
            let base = Url::parse(base).unwrap();
            assert_eq!(
                resolve_against_base(&base, "/api/contacts").unwrap().as_str(),
                "https://host.example.com/pbx/api/contacts"
            );
            assert_eq!(
                resolve_against_base(&base, "/api/contacts?page=2").unwrap().as_str(),
                "https://host.example.com/pbx/api/contacts?page=2"
            );
            assert_eq!(
                resolve_against_base(&base, "/pbx/api/contacts?page=3").unwrap().as_str(),
                "https://host.example.com/pbx/api/contacts?page=3"
            );
        }
    }
}
