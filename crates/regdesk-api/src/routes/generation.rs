//! # Generation and Submit API
//!
//! ## Endpoints
//!
//! - `POST /v1/companies/:id/generate/laws`: regenerate the company's laws
//! - `POST /v1/companies/:id/generate/control-framework`: add generated
//!   control framework entries
//! - `POST /v1/companies/:id/submit`: mark every entry verified
//!
//! Generation needs the webhooks and answers 503 without them. A run is
//! spawned on its own task; if the client goes away the run is cancelled
//! at its next checkpoint, and a write that already started still finishes.

use std::future::Future;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use regdesk_core::CompanyId;
use regdesk_workflow::{GenerationReport, WorkflowError};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::state::AppState;

/// Submit response.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub company: CompanyId,
    pub verified: usize,
}

/// Build the generation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/companies/:id/generate/laws", post(generate_laws))
        .route(
            "/v1/companies/:id/generate/control-framework",
            post(generate_control_framework),
        )
        .route("/v1/companies/:id/submit", post(submit))
}

/// Run `job` on its own task, cancelling it if this future is dropped.
async fn run_detached<F, Fut>(job: F) -> Result<GenerationReport, AppError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<GenerationReport, WorkflowError>> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let handle = tokio::spawn(job(cancel));
    let joined = handle.await;
    guard.disarm();
    joined
        .map_err(|e| AppError::Internal(format!("generation task failed: {e}")))?
        .map_err(AppError::from)
}

/// POST /v1/companies/:id/generate/laws: replace laws with generated ones.
async fn generate_laws(
    State(state): State<AppState>,
    Path(company): Path<CompanyId>,
) -> Result<Json<GenerationReport>, AppError> {
    let pipeline = state.pipeline()?;
    let report = run_detached(move |cancel| async move {
        pipeline.generate_laws(company, &cancel).await
    })
    .await?;
    Ok(Json(report))
}

/// POST /v1/companies/:id/generate/control-framework: add generated entries.
async fn generate_control_framework(
    State(state): State<AppState>,
    Path(company): Path<CompanyId>,
) -> Result<Json<GenerationReport>, AppError> {
    let pipeline = state.pipeline()?;
    let report = run_detached(move |cancel| async move {
        pipeline.generate_control_framework(company, &cancel).await
    })
    .await?;
    Ok(Json(report))
}

/// POST /v1/companies/:id/submit: verify every control framework entry.
async fn submit(
    State(state): State<AppState>,
    Path(company): Path<CompanyId>,
) -> Result<Json<SubmitResponse>, AppError> {
    let verified = regdesk_workflow::submit(&*state.store, company).await?;
    Ok(Json(SubmitResponse { company, verified }))
}
