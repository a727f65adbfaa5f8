//! # Tags API
//!
//! Domains, activities, and markets. The three kinds share handlers; each
//! gets its own path segment (`domains`, `activities`, `markets`).
//!
//! ## Endpoints
//!
//! - `GET    /v1/companies/:id/{kind}`: the company's tags, newest first
//! - `POST   /v1/companies/:id/{kind}`: add a tag
//! - `PUT    /v1/{kind}/:tag_id`: rename
//! - `DELETE /v1/{kind}/:tag_id`: delete; refused with 409 when it is the
//!   company's last tag of that kind

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use regdesk_core::{CompanyId, NewTag, Tag, TagId, TagKind, TagPatch};
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json};
use crate::state::AppState;

/// Body of a tag create. The owning company comes from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

/// Build the router for all three tag kinds.
pub fn router() -> Router<AppState> {
    TagKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| router.merge(kind_router(kind)))
}

fn kind_router(kind: TagKind) -> Router<AppState> {
    let segment = kind.table().as_str();
    Router::new()
        .route(
            &format!("/v1/companies/:id/{segment}"),
            get(move |state: State<AppState>, path: Path<CompanyId>| list_tags(state, path, kind))
                .post(
                    move |state: State<AppState>,
                          path: Path<CompanyId>,
                          body: Result<Json<CreateTagRequest>, JsonRejection>| {
                        create_tag(state, path, body, kind)
                    },
                ),
        )
        .route(
            &format!("/v1/{segment}/:tag_id"),
            put(
                move |state: State<AppState>,
                      path: Path<TagId>,
                      body: Result<Json<TagPatch>, JsonRejection>| {
                    rename_tag(state, path, body, kind)
                },
            )
            .delete(move |state: State<AppState>, path: Path<TagId>| {
                delete_tag(state, path, kind)
            }),
        )
}

async fn list_tags(
    State(state): State<AppState>,
    Path(company): Path<CompanyId>,
    kind: TagKind,
) -> Result<Json<Vec<Tag>>, AppError> {
    state.store.get_company(company).await?;
    Ok(Json(state.store.list_tags(kind, Some(company)).await?))
}

async fn create_tag(
    State(state): State<AppState>,
    Path(company): Path<CompanyId>,
    body: Result<Json<CreateTagRequest>, JsonRejection>,
    kind: TagKind,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let new = NewTag {
        name: extract_json(body)?.name,
        id_company: company,
    };
    new.validate()?;
    state.store.get_company(company).await?;
    let tag = state.store.insert_tag(kind, &new).await?;
    tracing::info!(company = %company, kind = %kind, tag = %tag.id, "tag created");
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn rename_tag(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
    body: Result<Json<TagPatch>, JsonRejection>,
    kind: TagKind,
) -> Result<Json<Tag>, AppError> {
    let patch = extract_validated_json(body)?;
    Ok(Json(state.store.update_tag(kind, id, &patch).await?))
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
    kind: TagKind,
) -> Result<StatusCode, AppError> {
    regdesk_workflow::delete_tag(&*state.store, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
