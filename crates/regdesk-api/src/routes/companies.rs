//! # Companies API
//!
//! Company records and the company detail aggregate.
//!
//! ## Endpoints
//!
//! - `GET    /v1/companies`: paged list (`search`, `country`, `status`, `page`)
//! - `POST   /v1/companies`: create
//! - `GET    /v1/companies/:id`: one company
//! - `PUT    /v1/companies/:id`: partial update
//! - `DELETE /v1/companies/:id`: delete permanently
//! - `GET    /v1/companies/:id/detail`: tags, laws, and control framework in
//!   one document, echoing the navigation state (`return_url`, `expanded`)

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use regdesk_core::{Company, CompanyId, CompanyPatch, Facet, NewCompany, Page, ValidationError};
use regdesk_workflow::CompanySnapshot;
use serde::{Deserialize, Serialize};

use super::ListQuery;
use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json};
use crate::state::AppState;

/// Where the detail view sends the user back to when none is given.
pub const DEFAULT_RETURN_URL: &str = "/companies";

// ── DTOs ────────────────────────────────────────────────────────────

/// Navigation parameters of the detail view.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetailQuery {
    /// Local path to return to.
    pub return_url: Option<String>,
    /// Comma-separated names of the expanded sections.
    pub expanded: Option<String>,
}

/// Navigation state echoed back with the detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub return_url: String,
    pub expanded: Vec<String>,
}

/// Company detail response.
#[derive(Debug, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub snapshot: CompanySnapshot,
    pub navigation: Navigation,
}

/// Resolve the return URL. Only same-origin paths are accepted; a missing
/// value means [`DEFAULT_RETURN_URL`].
pub fn local_return_url(raw: Option<&str>) -> Result<String, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_RETURN_URL.to_string());
    };
    if !raw.starts_with('/') || raw.starts_with("//") || raw.contains('\\') {
        return Err(ValidationError::InvalidReturnUrl(raw.to_string()));
    }
    Ok(raw.to_string())
}

fn expanded_sections(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the companies router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/companies", get(list_companies).post(create_company))
        .route(
            "/v1/companies/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/v1/companies/:id/detail", get(company_detail))
}

/// GET /v1/companies: filtered, paged company list.
async fn list_companies(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<Company>>, AppError> {
    let query = extract_query(query)?;
    let companies = state.store.list_companies().await?;
    let page = query
        .list_state(&[Facet::Country, Facet::Status])
        .apply(&companies);
    Ok(Json(page))
}

/// POST /v1/companies: create a company.
async fn create_company(
    State(state): State<AppState>,
    body: Result<Json<NewCompany>, JsonRejection>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    let new = extract_validated_json(body)?;
    let company = state.store.insert_company(&new).await?;
    tracing::info!(company = %company.id, "company created");
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /v1/companies/:id: one company.
async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
) -> Result<Json<Company>, AppError> {
    Ok(Json(state.store.get_company(id).await?))
}

/// PUT /v1/companies/:id: partial update.
async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
    body: Result<Json<CompanyPatch>, JsonRejection>,
) -> Result<Json<Company>, AppError> {
    let patch = extract_validated_json(body)?;
    Ok(Json(state.store.update_company(id, &patch).await?))
}

/// DELETE /v1/companies/:id: delete permanently.
async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
) -> Result<StatusCode, AppError> {
    state.store.delete_company(id).await?;
    tracing::info!(company = %id, "company deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/companies/:id/detail: the company detail aggregate.
async fn company_detail(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
    query: Result<Query<DetailQuery>, QueryRejection>,
) -> Result<Json<CompanyDetail>, AppError> {
    let query = extract_query(query)?;
    let navigation = Navigation {
        return_url: local_return_url(query.return_url.as_deref())?,
        expanded: expanded_sections(query.expanded.as_deref()),
    };
    let snapshot = CompanySnapshot::load(&*state.store, id).await?;
    Ok(Json(CompanyDetail {
        snapshot,
        navigation,
    }))
}
