//! Contract tests for RestStore against a PostgREST-style backend.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/rest/v1/laws_and_regulations` | `list_laws_*` |
//! | GET    | `/rest/v1/companies?id=eq.{id}` | `get_company_*` |
//! | POST   | `/rest/v1/domains` | `insert_tag_*` |
//! | PATCH  | `/rest/v1/control_framework` | `verify_*` |
//! | DELETE | `/rest/v1/{table}?id=eq.{id}` | `delete_*` |
//! | POST + DELETE | `/rest/v1/laws_and_regulations` | `replace_laws_*` |

use regdesk_client::{BackendConfig, RecordStore, RestStore, StoreError};
use regdesk_core::{
    CompanyId, ControlFrameworkId, LawId, NewCompany, NewLaw, NewTag, Table, TagKind,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPANY: &str = "550e8400-e29b-41d4-a716-446655440000";

fn test_store(mock_server: &MockServer) -> RestStore {
    let config = BackendConfig {
        backend_url: mock_server.uri().parse().unwrap(),
        api_key: zeroize::Zeroizing::new("anon-key".into()),
        timeout_secs: 5,
    };
    RestStore::new(&config).unwrap()
}

fn company_id() -> CompanyId {
    COMPANY.parse().unwrap()
}

fn law_row(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "description": "desc",
        "source": "gazette",
        "country": "US",
        "id_company": COMPANY,
        "id_domain": "550e8400-e29b-41d4-a716-4466554400d1",
        "id_activity": null,
        "id_market": null,
        "created_at": "2026-01-15T12:00:00Z",
        "domains": { "name": "Finance" },
        "activities": null,
        "markets": null
    })
}

fn new_law(name: &str) -> NewLaw {
    NewLaw {
        name: name.into(),
        description: String::new(),
        source: String::new(),
        country: "US".into(),
        id_company: company_id(),
        id_domain: None,
        id_activity: None,
        id_market: None,
    }
}

// -- GET --------------------------------------------------------------------------

#[tokio::test]
async fn list_laws_scopes_by_company_and_joins_names() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/laws_and_regulations"))
        .and(query_param("id_company", format!("eq.{COMPANY}")))
        .and(query_param("order", "created_at.desc"))
        .and(query_param(
            "select",
            "*,domains(name),activities(name),markets(name)",
        ))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            law_row("550e8400-e29b-41d4-a716-446655440011", "GDPR"),
            law_row("550e8400-e29b-41d4-a716-446655440012", "SOX"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let laws = test_store(&mock_server)
        .list_laws(Some(company_id()))
        .await
        .unwrap();
    assert_eq!(laws.len(), 2);
    assert_eq!(laws[0].name, "GDPR");
    assert_eq!(laws[0].domain_name(), Some("Finance"));
    assert_eq!(laws[1].activity_name(), None);
}

#[tokio::test]
async fn get_company_empty_result_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/companies"))
        .and(query_param("id", format!("eq.{COMPANY}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let err = test_store(&mock_server)
        .get_company(company_id())
        .await
        .unwrap_err();
    match err {
        StoreError::NotFound { table, id } => {
            assert_eq!(table, Table::Companies);
            assert_eq!(id, COMPANY);
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn backend_rejection_surfaces_status_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/companies"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let err = test_store(&mock_server).list_companies().await.unwrap_err();
    match err {
        StoreError::Api { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

// -- POST / PATCH / DELETE ------------------------------------------------------

#[tokio::test]
async fn insert_tag_asks_for_representation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/domains"))
        .and(header("prefer", "return=representation"))
        .and(body_json(serde_json::json!({
            "name": "Finance",
            "id_company": COMPANY
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{
            "id": "550e8400-e29b-41d4-a716-4466554400d1",
            "name": "Finance",
            "id_company": COMPANY
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tag = test_store(&mock_server)
        .insert_tag(
            TagKind::Domain,
            &NewTag {
                name: "Finance".into(),
                id_company: company_id(),
            },
        )
        .await
        .unwrap();
    assert_eq!(tag.name, "Finance");
    assert_eq!(tag.id_company, company_id());
}

#[tokio::test]
async fn blank_insert_never_reaches_backend() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = test_store(&mock_server)
        .insert_laws(&[new_law("")])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn verify_patches_only_unverified_rows_of_company() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/control_framework"))
        .and(query_param("id_company", format!("eq.{COMPANY}")))
        .and(query_param("verified", "eq.false"))
        .and(body_json(serde_json::json!({ "verified": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "550e8400-e29b-41d4-a716-446655440021" },
            { "id": "550e8400-e29b-41d4-a716-446655440022" },
            { "id": "550e8400-e29b-41d4-a716-446655440023" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let changed = test_store(&mock_server)
        .verify_control_frameworks(company_id())
        .await
        .unwrap();
    assert_eq!(changed, 3);
}

#[tokio::test]
async fn delete_missing_row_is_not_found() {
    let mock_server = MockServer::start().await;
    let id = ControlFrameworkId::new();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/control_framework"))
        .and(query_param("id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = test_store(&mock_server)
        .delete_control_framework(id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_missing_law_is_not_found() {
    let mock_server = MockServer::start().await;
    let id = LawId::new();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/laws_and_regulations"))
        .and(query_param("id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = test_store(&mock_server).delete_law(id).await.unwrap_err();
    assert!(err.is_not_found());
}

// -- transport failures -------------------------------------------------------

fn unreachable_store() -> RestStore {
    // Nothing listens on port 1.
    RestStore::new(&BackendConfig::local_mock(1, "anon-key").unwrap()).unwrap()
}

#[tokio::test]
async fn reads_back_off_before_giving_up() {
    let started = std::time::Instant::now();
    let err = unreachable_store()
        .get_company(company_id())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Http { .. }));
    // 200 + 400 + 800 ms of backoff.
    assert!(started.elapsed() >= std::time::Duration::from_millis(1400));
}

#[tokio::test]
async fn inserts_fail_without_backoff() {
    let started = std::time::Instant::now();
    let new = NewCompany {
        name: "Acme".into(),
        website: None,
        duns_number: None,
        country: "US".into(),
        status: Default::default(),
    };
    let err = unreachable_store().insert_company(&new).await.unwrap_err();
    assert!(matches!(err, StoreError::Http { .. }));
    assert!(started.elapsed() < std::time::Duration::from_millis(200));
}

// -- replace_laws ---------------------------------------------------------------

#[tokio::test]
async fn replace_laws_inserts_before_deleting_superseded() {
    let mock_server = MockServer::start().await;
    let old_id = "550e8400-e29b-41d4-a716-446655440011";
    let new_id = "550e8400-e29b-41d4-a716-446655440099";
    let newer_id = "550e8400-e29b-41d4-a716-4466554400aa";

    let mut new_row = law_row(new_id, "new");
    new_row["created_at"] = "2026-02-01T09:00:00Z".into();
    // Written by an overlapping run after this one's insert.
    let mut newer_row = law_row(newer_id, "newer");
    newer_row["created_at"] = "2026-02-01T09:00:05Z".into();

    Mock::given(method("POST"))
        .and(path("/rest/v1/laws_and_regulations"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([new_row.clone()])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/laws_and_regulations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            newer_row,
            new_row,
            law_row(old_id, "old"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/laws_and_regulations"))
        .and(query_param("id", format!("in.({old_id})")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": old_id }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = test_store(&mock_server)
        .replace_laws(company_id(), &[new_law("new")])
        .await
        .unwrap();
    assert_eq!(outcome.removed, 1);
    assert_eq!(outcome.inserted[0].name, "new");
}

#[tokio::test]
async fn replace_laws_keeps_old_rows_when_insert_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/laws_and_regulations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([law_row(
            "550e8400-e29b-41d4-a716-446655440011",
            "old"
        )])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/laws_and_regulations"))
        .respond_with(ResponseTemplate::new(500).set_body_string("insert failed"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = test_store(&mock_server)
        .replace_laws(company_id(), &[new_law("new")])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 500, .. }));
}
