//! Tests for the Supabase REST store against a mocked PostgREST endpoint

use dashsync_common::types::TenantId;
use dashsync_ingest::credential::Credential;
use dashsync_ingest::loader::{Loader, MemoryStore, RecordStore, SupabaseStore};
use dashsync_ingest::normalize::{normalize_batch, SyncContext, TableBatch, TableSpec};
use dashsync_ingest::orchestrator::EtlOrchestrator;
use dashsync_ingest::report::TableOutcome;
use dashsync_ingest::sources::meta::MetaConnector;
use dashsync_ingest::IngestError;
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const SERVICE_KEY: &str = "service-role-key";
const CONTACTS: TableSpec = TableSpec::new("3cx_contacts", "contact_id");

fn store(server: &MockServer) -> SupabaseStore {
    SupabaseStore::new(
        Url::parse(&server.uri()).unwrap(),
        Credential::new(SERVICE_KEY).unwrap(),
    )
    .unwrap()
}

fn header_value(request: &wiremock::Request, name: &str) -> String {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_upsert_posts_rows_with_conflict_target() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/3cx_contacts"))
        .and(query_param("on_conflict", "tenant_id,contact_id"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = SyncContext::new(TenantId::new(Uuid::new_v4()));
    let batch = normalize_batch(
        CONTACTS,
        vec![json!({ "contact_id": "c1" }), json!({ "contact_id": "c2" })],
        &ctx,
    )
    .unwrap();

    let outcome = Loader::new(Arc::new(store(&server))).load(&batch).await.unwrap();
    assert_eq!(outcome, TableOutcome::Loaded { rows: 2, written: 2 });

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(header_value(request, "apikey"), SERVICE_KEY);
    assert_eq!(header_value(request, "authorization"), format!("Bearer {}", SERVICE_KEY));
    assert_eq!(header_value(request, "prefer"), "resolution=merge-duplicates,return=minimal");

    let body: Value = request.body_json().unwrap();
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["contact_id"], "c1");
    assert_eq!(rows[0]["tenant_id"], ctx.tenant_id.to_string());
}

#[tokio::test]
async fn test_rejected_write_names_the_table() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/3cx_contacts"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "duplicate key value" })),
        )
        .mount(&server)
        .await;

    let ctx = SyncContext::new(TenantId::new(Uuid::new_v4()));
    let batch = normalize_batch(CONTACTS, vec![json!({ "contact_id": "c1" })], &ctx).unwrap();

    let err = Loader::new(Arc::new(store(&server))).load(&batch).await.unwrap_err();
    match err {
        IngestError::Store { table, message } => {
            assert_eq!(table, "3cx_contacts");
            assert!(message.contains("409 Conflict"));
            assert!(message.contains("duplicate key value"));
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_empty_batch_sends_nothing() {
    let server = MockServer::start().await;

    let outcome = Loader::new(Arc::new(store(&server)))
        .load(&TableBatch::empty(CONTACTS))
        .await
        .unwrap();

    assert_eq!(outcome, TableOutcome::Empty);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_report_is_posted_to_ledger() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/etl_runs"))
        .and(query_param("on_conflict", "run_id"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(&server);
    let credential = Credential::new("token").unwrap();
    let tenant = TenantId::new(Uuid::new_v4());

    // Skipped runs are not recorded, so record a report directly
    let report = EtlOrchestrator::new(Arc::new(MemoryStore::new()))
        .run(&MetaConnector, Some(&credential), tenant)
        .await;
    store.record_run(&report).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["run_id"], report.run_id.to_string());
    assert_eq!(body["source"], "meta");
    assert_eq!(body["status"], "skipped");
    assert_eq!(
        header_value(&requests[0], "prefer"),
        "resolution=ignore-duplicates,return=minimal"
    );
}
