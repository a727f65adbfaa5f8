//! # Laws and Regulations API
//!
//! ## Endpoints
//!
//! - `GET    /v1/companies/:id/laws`: paged list (`search`, `domain`,
//!   `activity`, `market`, `country`, `page`)
//! - `POST   /v1/companies/:id/laws`: add a law
//! - `GET    /v1/laws/:law_id`: one law
//! - `PUT    /v1/laws/:law_id`: partial update
//! - `DELETE /v1/laws/:law_id`: delete
//!
//! Domain, activity, and market references must belong to the law's
//! company; anything else is a 422.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use regdesk_core::{CompanyId, Facet, LawId, LawPatch, LawRegulation, NewLaw, Page, TagId};
use regdesk_workflow::{check_links, CompanySnapshot, Links};
use serde::Deserialize;

use super::ListQuery;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query, extract_validated_json};
use crate::state::AppState;

const LAW_FACETS: [Facet; 4] = [Facet::Domain, Facet::Activity, Facet::Market, Facet::Country];

// ── DTOs ────────────────────────────────────────────────────────────

/// Body of a law create. The owning company comes from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLawRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub id_domain: Option<TagId>,
    #[serde(default)]
    pub id_activity: Option<TagId>,
    #[serde(default)]
    pub id_market: Option<TagId>,
}

impl CreateLawRequest {
    fn into_new(self, company: CompanyId) -> NewLaw {
        NewLaw {
            name: self.name,
            description: self.description,
            source: self.source,
            country: self.country,
            id_company: company,
            id_domain: self.id_domain,
            id_activity: self.id_activity,
            id_market: self.id_market,
        }
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the laws router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/companies/:id/laws", get(list_laws).post(create_law))
        .route(
            "/v1/laws/:law_id",
            get(get_law).put(update_law).delete(delete_law),
        )
}

/// GET /v1/companies/:id/laws: filtered, paged laws of one company.
async fn list_laws(
    State(state): State<AppState>,
    Path(company): Path<CompanyId>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<LawRegulation>>, AppError> {
    let query = extract_query(query)?;
    state.store.get_company(company).await?;
    let laws = state.store.list_laws(Some(company)).await?;
    Ok(Json(query.list_state(&LAW_FACETS).apply(&laws)))
}

/// POST /v1/companies/:id/laws: add a law.
async fn create_law(
    State(state): State<AppState>,
    Path(company): Path<CompanyId>,
    body: Result<Json<CreateLawRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LawRegulation>), AppError> {
    let new = extract_json(body)?.into_new(company);
    new.validate()?;
    let snapshot = CompanySnapshot::load(&*state.store, company).await?;
    check_links(&snapshot, &Links::from(&new))?;
    let law = state.store.insert_law(&new).await?;
    tracing::info!(company = %company, law = %law.id, "law created");
    Ok((StatusCode::CREATED, Json(law)))
}

/// GET /v1/laws/:law_id: one law with its joined tag names.
async fn get_law(
    State(state): State<AppState>,
    Path(id): Path<LawId>,
) -> Result<Json<LawRegulation>, AppError> {
    Ok(Json(state.store.get_law(id).await?))
}

/// PUT /v1/laws/:law_id: partial update.
async fn update_law(
    State(state): State<AppState>,
    Path(id): Path<LawId>,
    body: Result<Json<LawPatch>, JsonRejection>,
) -> Result<Json<LawRegulation>, AppError> {
    let patch = extract_validated_json(body)?;
    let current = state.store.get_law(id).await?;
    let snapshot = CompanySnapshot::load(&*state.store, current.id_company).await?;
    check_links(&snapshot, &Links::from(&patch))?;
    Ok(Json(state.store.update_law(id, &patch).await?))
}

/// DELETE /v1/laws/:law_id: delete one law.
async fn delete_law(
    State(state): State<AppState>,
    Path(id): Path<LawId>,
) -> Result<StatusCode, AppError> {
    state.store.delete_law(id).await?;
    tracing::info!(law = %id, "law deleted");
    Ok(StatusCode::NO_CONTENT)
}
