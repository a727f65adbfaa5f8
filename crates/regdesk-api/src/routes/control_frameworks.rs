//! # Control Framework API
//!
//! ## Endpoints
//!
//! - `GET    /v1/companies/:id/control-frameworks`: paged list (`search`,
//!   `domain`, `activity`, `market`, `country`, `law`, `verification`, `page`)
//! - `POST   /v1/companies/:id/control-frameworks`: add an entry (unverified)
//! - `GET    /v1/control-frameworks/:cf_id`: one entry
//! - `PUT    /v1/control-frameworks/:cf_id`: partial update
//! - `DELETE /v1/control-frameworks/:cf_id`: delete
//! - `GET    /v1/control-frameworks/:cf_id/export`: xlsx download
//!
//! `verified` cannot be written here; only the submit endpoint sets it.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use regdesk_core::{
    CompanyId, ControlFramework, ControlFrameworkId, ControlFrameworkPatch, Facet, LawId,
    NewControlFramework, Page, TagId,
};
use regdesk_workflow::{check_links, export_control_framework, CompanySnapshot, Export, Links};
use serde::Deserialize;

use super::ListQuery;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query, extract_validated_json};
use crate::state::AppState;

const CONTROL_FACETS: [Facet; 6] = [
    Facet::Domain,
    Facet::Activity,
    Facet::Market,
    Facet::Country,
    Facet::Law,
    Facet::Verification,
];

// ── DTOs ────────────────────────────────────────────────────────────

/// Body of a control framework create. The owning company comes from the
/// path; `verified` always starts out `false`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateControlFrameworkRequest {
    pub context: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub risk_management: String,
    #[serde(default)]
    pub country_applied: String,
    #[serde(default)]
    pub referral_source: String,
    #[serde(default)]
    pub id_domain: Option<TagId>,
    #[serde(default)]
    pub id_activity: Option<TagId>,
    #[serde(default)]
    pub id_market: Option<TagId>,
    #[serde(default)]
    pub id_laws_and_regulations: Option<LawId>,
}

impl CreateControlFrameworkRequest {
    fn into_new(self, company: CompanyId) -> NewControlFramework {
        NewControlFramework {
            context: self.context,
            description: self.description,
            risk_management: self.risk_management,
            country_applied: self.country_applied,
            referral_source: self.referral_source,
            id_domain: self.id_domain,
            id_activity: self.id_activity,
            id_market: self.id_market,
            id_laws_and_regulations: self.id_laws_and_regulations,
            id_company: company,
            verified: false,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the control framework router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/companies/:id/control-frameworks",
            get(list_control_frameworks).post(create_control_framework),
        )
        .route(
            "/v1/control-frameworks/:cf_id",
            get(get_control_framework)
                .put(update_control_framework)
                .delete(delete_control_framework),
        )
        .route("/v1/control-frameworks/:cf_id/export", get(export))
}

/// GET /v1/companies/:id/control-frameworks: filtered, paged entries.
async fn list_control_frameworks(
    State(state): State<AppState>,
    Path(company): Path<CompanyId>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<ControlFramework>>, AppError> {
    let query = extract_query(query)?;
    state.store.get_company(company).await?;
    let entries = state.store.list_control_frameworks(Some(company)).await?;
    Ok(Json(query.list_state(&CONTROL_FACETS).apply(&entries)))
}

/// POST /v1/companies/:id/control-frameworks: add an unverified entry.
async fn create_control_framework(
    State(state): State<AppState>,
    Path(company): Path<CompanyId>,
    body: Result<Json<CreateControlFrameworkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ControlFramework>), AppError> {
    let new = extract_json(body)?.into_new(company);
    new.validate()?;
    let snapshot = CompanySnapshot::load(&*state.store, company).await?;
    check_links(&snapshot, &Links::from(&new))?;
    let entry = state.store.insert_control_framework(&new).await?;
    tracing::info!(company = %company, control_framework = %entry.id, "control framework entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /v1/control-frameworks/:cf_id: one entry with joined names.
async fn get_control_framework(
    State(state): State<AppState>,
    Path(id): Path<ControlFrameworkId>,
) -> Result<Json<ControlFramework>, AppError> {
    Ok(Json(state.store.get_control_framework(id).await?))
}

/// PUT /v1/control-frameworks/:cf_id: partial update.
async fn update_control_framework(
    State(state): State<AppState>,
    Path(id): Path<ControlFrameworkId>,
    body: Result<Json<ControlFrameworkPatch>, JsonRejection>,
) -> Result<Json<ControlFramework>, AppError> {
    let patch = extract_validated_json(body)?;
    let current = state.store.get_control_framework(id).await?;
    let snapshot = CompanySnapshot::load(&*state.store, current.id_company).await?;
    check_links(&snapshot, &Links::from(&patch))?;
    Ok(Json(state.store.update_control_framework(id, &patch).await?))
}

/// DELETE /v1/control-frameworks/:cf_id: delete one entry.
async fn delete_control_framework(
    State(state): State<AppState>,
    Path(id): Path<ControlFrameworkId>,
) -> Result<StatusCode, AppError> {
    state.store.delete_control_framework(id).await?;
    tracing::info!(control_framework = %id, "control framework entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/control-frameworks/:cf_id/export: the entry as a one-row workbook.
async fn export(
    State(state): State<AppState>,
    Path(id): Path<ControlFrameworkId>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.store.get_control_framework(id).await?;
    let Export { file_name, bytes } = export_control_framework(&entry)?;
    Ok((
        [
            (header::CONTENT_TYPE, Export::CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    ))
}
