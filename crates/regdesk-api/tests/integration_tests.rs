//! # Integration Tests for regdesk-api
//!
//! Drives the router end to end over in-memory tables: company CRUD and
//! listing, tag guard, link checks, generation with and without webhooks,
//! submit, export, and the detail navigation echo.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use regdesk_api::state::AppState;
use regdesk_client::{
    ControlFrameworkRequest, ControlFrameworkResponse, GeneratedControl, GeneratedLaw,
    Generator, LawsRequest, LawsResponse, MemoryStore, OneOrMany, WebhookError,
};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Generator that answers with fixed proposals, or fails every call.
struct FixedGenerator {
    fail: bool,
}

#[async_trait]
impl Generator for FixedGenerator {
    async fn generate_laws(&self, _request: &LawsRequest) -> Result<LawsResponse, WebhookError> {
        if self.fail {
            return Err(WebhookError::Status {
                endpoint: "POST laws".into(),
                status: 500,
                body: "model overloaded".into(),
            });
        }
        Ok(LawsResponse {
            laws_and_regulations: vec![GeneratedLaw {
                name: "Bank Secrecy Act".into(),
                description: "AML reporting".into(),
                source: "31 U.S.C. 5311".into(),
                country: Some("US".into()),
                business_domains: ["Finance"].into_iter().collect(),
                activities: OneOrMany::default(),
                markets: OneOrMany::default(),
            }],
        })
    }

    async fn generate_control_framework(
        &self,
        _request: &ControlFrameworkRequest,
    ) -> Result<ControlFrameworkResponse, WebhookError> {
        Ok(ControlFrameworkResponse {
            control_framework: vec![GeneratedControl {
                context: "Transaction monitoring".into(),
                description: "Flag structured deposits".into(),
                business_domain: ["Finance"].into_iter().collect(),
                regulations: ["Bank Secrecy Act"].into_iter().collect(),
                ..GeneratedControl::default()
            }],
        })
    }
}

/// Helper: app over empty in-memory tables, without webhooks.
fn test_app() -> axum::Router {
    regdesk_api::app(AppState::in_memory())
}

/// Helper: app over empty in-memory tables with a fixed generator.
fn test_app_with_generator(fail: bool) -> axum::Router {
    let generator: Arc<dyn Generator> = Arc::new(FixedGenerator { fail });
    regdesk_api::app(AppState::new(MemoryStore::new(), Some(generator)))
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: send a request with an optional JSON body and parse the JSON reply.
async fn call(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let text = body_string(response).await;
    let json = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, json)
}

/// Helper: create a company with one domain named `domain`; returns its id.
async fn seed_company(app: &axum::Router, name: &str, domain: &str) -> String {
    let (status, company) = call(
        app,
        "POST",
        "/v1/companies",
        Some(json!({ "name": name, "country": "US", "website": "https://example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = company["id"].as_str().unwrap().to_string();
    let (status, _) = call(
        app,
        "POST",
        &format!("/v1/companies/{id}/domains"),
        Some(json!({ "name": domain })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    id
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_check() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health/liveness").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_check() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health/readiness").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Companies ----------------------------------------------------------------

#[tokio::test]
async fn test_company_list_search_and_paging() {
    let app = test_app();
    for i in 0..12 {
        seed_company(&app, &format!("Acme {i}"), "Finance").await;
    }
    seed_company(&app, "Globex", "Retail").await;

    let (status, page) = call(&app, "GET", "/v1/companies?search=acme&page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_items"], 12);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["page"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);

    let (_, clamped) = call(&app, "GET", "/v1/companies?search=globex&page=9", None).await;
    assert_eq!(clamped["page"], 1);
    assert_eq!(clamped["items"][0]["name"], "Globex");
}

#[tokio::test]
async fn test_blank_company_name_is_422() {
    let app = test_app();
    let (status, body) = call(
        &app,
        "POST",
        "/v1/companies",
        Some(json!({ "name": "  ", "country": "US" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, page) = call(&app, "GET", "/v1/companies", None).await;
    assert_eq!(page["total_items"], 0);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/companies")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_company_is_404() {
    let app = test_app();
    let (status, body) = call(
        &app,
        "GET",
        "/v1/companies/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_company_detail_echoes_navigation() {
    let app = test_app();
    let id = seed_company(&app, "Acme", "Finance").await;

    let (status, detail) = call(
        &app,
        "GET",
        &format!("/v1/companies/{id}/detail?return_url=/companies%3Fpage%3D2&expanded=laws"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["company"]["name"], "Acme");
    assert_eq!(detail["domains"][0]["name"], "Finance");
    assert_eq!(detail["navigation"]["return_url"], "/companies?page=2");
    assert_eq!(detail["navigation"]["expanded"], json!(["laws"]));

    let (status, _) = call(
        &app,
        "GET",
        &format!("/v1/companies/{id}/detail?return_url=https://evil.example"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Tags ---------------------------------------------------------------------

#[tokio::test]
async fn test_last_tag_delete_is_409() {
    let app = test_app();
    let id = seed_company(&app, "Acme", "Finance").await;
    let (_, domains) = call(&app, "GET", &format!("/v1/companies/{id}/domains"), None).await;
    let finance = domains[0]["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, "DELETE", &format!("/v1/domains/{finance}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    call(
        &app,
        "POST",
        &format!("/v1/companies/{id}/domains"),
        Some(json!({ "name": "Retail" })),
    )
    .await;
    let (status, _) = call(&app, "DELETE", &format!("/v1/domains/{finance}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, domains) = call(&app, "GET", &format!("/v1/companies/{id}/domains"), None).await;
    assert_eq!(domains.as_array().unwrap().len(), 1);
    assert_eq!(domains[0]["name"], "Retail");
}

#[tokio::test]
async fn test_tag_rename() {
    let app = test_app();
    let id = seed_company(&app, "Acme", "Finance").await;
    let (_, tag) = call(
        &app,
        "POST",
        &format!("/v1/companies/{id}/markets"),
        Some(json!({ "name": "EU" })),
    )
    .await;
    let tag_id = tag["id"].as_str().unwrap();

    let (status, renamed) = call(
        &app,
        "PUT",
        &format!("/v1/markets/{tag_id}"),
        Some(json!({ "name": "European Union" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "European Union");
}

// -- Laws and Control Framework -----------------------------------------------

#[tokio::test]
async fn test_law_with_other_company_domain_is_422() {
    let app = test_app();
    let acme = seed_company(&app, "Acme", "Finance").await;
    let globex = seed_company(&app, "Globex", "Retail").await;
    let (_, globex_domains) =
        call(&app, "GET", &format!("/v1/companies/{globex}/domains"), None).await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/v1/companies/{acme}/laws"),
        Some(json!({ "name": "GDPR", "id_domain": globex_domains[0]["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["message"].as_str().unwrap().contains("id_domain"));
}

#[tokio::test]
async fn test_law_facet_filter_uses_display_names() {
    let app = test_app();
    let id = seed_company(&app, "Acme", "Finance").await;
    let (_, domains) = call(&app, "GET", &format!("/v1/companies/{id}/domains"), None).await;
    call(
        &app,
        "POST",
        &format!("/v1/companies/{id}/laws"),
        Some(json!({ "name": "Dodd-Frank", "id_domain": domains[0]["id"] })),
    )
    .await;
    call(
        &app,
        "POST",
        &format!("/v1/companies/{id}/laws"),
        Some(json!({ "name": "Unscoped" })),
    )
    .await;

    let (_, page) = call(&app, "GET", &format!("/v1/companies/{id}/laws?domain=Finance"), None).await;
    assert_eq!(page["total_items"], 1);
    assert_eq!(page["items"][0]["name"], "Dodd-Frank");
    assert_eq!(page["items"][0]["domains"]["name"], "Finance");

    let (_, page) = call(&app, "GET", &format!("/v1/companies/{id}/laws?domain=all"), None).await;
    assert_eq!(page["total_items"], 2);
}

#[tokio::test]
async fn test_submit_verifies_and_export_downloads() {
    let app = test_app();
    let id = seed_company(&app, "Acme", "Finance").await;
    let (status, entry) = call(
        &app,
        "POST",
        &format!("/v1/companies/{id}/control-frameworks"),
        Some(json!({ "context": "Access reviews", "verified": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["verified"], false);
    let entry_id = entry["id"].as_str().unwrap().to_string();

    let (_, unverified) = call(
        &app,
        "GET",
        &format!("/v1/companies/{id}/control-frameworks?verification=unverified"),
        None,
    )
    .await;
    assert_eq!(unverified["total_items"], 1);

    let (status, submitted) = call(&app, "POST", &format!("/v1/companies/{id}/submit"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["verified"], 1);

    let (_, verified) = call(
        &app,
        "GET",
        &format!("/v1/companies/{id}/control-frameworks?verification=verified"),
        None,
    )
    .await;
    assert_eq!(verified["total_items"], 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/v1/control-frameworks/{entry_id}/export"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{entry_id}.xlsx\"").as_str()
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..2], b"PK");
}

// -- Generation ---------------------------------------------------------------

#[tokio::test]
async fn test_generation_without_webhooks_is_503() {
    let app = test_app();
    let id = seed_company(&app, "Acme", "Finance").await;
    let (status, body) = call(&app, "POST", &format!("/v1/companies/{id}/generate/laws"), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_generate_laws_then_control_framework() {
    let app = test_app_with_generator(false);
    let id = seed_company(&app, "Acme", "Finance").await;

    let (status, report) =
        call(&app, "POST", &format!("/v1/companies/{id}/generate/laws"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["requested"], 1);
    assert_eq!(report["inserted"], 1);
    assert_eq!(report["replaced"], 0);

    let (_, laws) = call(&app, "GET", &format!("/v1/companies/{id}/laws"), None).await;
    assert_eq!(laws["items"][0]["name"], "Bank Secrecy Act");
    assert_eq!(laws["items"][0]["domains"]["name"], "Finance");

    let (status, report) = call(
        &app,
        "POST",
        &format!("/v1/companies/{id}/generate/control-framework"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["inserted"], 1);

    let (_, entries) = call(
        &app,
        "GET",
        &format!("/v1/companies/{id}/control-frameworks?law=Bank%20Secrecy%20Act"),
        None,
    )
    .await;
    assert_eq!(entries["total_items"], 1);
    assert_eq!(entries["items"][0]["verified"], false);
    assert_eq!(entries["items"][0]["country_applied"], "US");
}

#[tokio::test]
async fn test_webhook_failure_is_502_and_keeps_laws() {
    let app = test_app_with_generator(true);
    let id = seed_company(&app, "Acme", "Finance").await;
    call(
        &app,
        "POST",
        &format!("/v1/companies/{id}/laws"),
        Some(json!({ "name": "Existing" })),
    )
    .await;

    let (status, body) = call(&app, "POST", &format!("/v1/companies/{id}/generate/laws"), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");

    let (_, laws) = call(&app, "GET", &format!("/v1/companies/{id}/laws"), None).await;
    assert_eq!(laws["total_items"], 1);
    assert_eq!(laws["items"][0]["name"], "Existing");
}
