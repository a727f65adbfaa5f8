//! # regdesk-api -- HTTP surface of the compliance console
//!
//! Every screen of the console is backed by a JSON endpoint here: company
//! lists and detail, tag editing, laws and control framework tables with
//! search, facets and paging, generation, submit, and export. Changes are
//! pushed to open clients over Server-Sent Events.
//!
//! ## API Surface
//!
//! | Prefix                                 | Module                          |
//! |----------------------------------------|---------------------------------|
//! | `/v1/companies`                        | [`routes::companies`]           |
//! | `/v1/companies/:id/{domains,...}`      | [`routes::tags`]                |
//! | `/v1/companies/:id/laws`, `/v1/laws`   | [`routes::laws`]                |
//! | `/v1/.../control-frameworks`           | [`routes::control_frameworks`]  |
//! | `/v1/companies/:id/generate/*`, `submit` | [`routes::generation`]        |
//! | `/v1/companies/:id/events`             | [`routes::events`]              |
//!
//! Errors use one JSON shape, see [`error::ErrorBody`].

pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::companies::router())
        .merge(routes::tags::router())
        .merge(routes::laws::router())
        .merge(routes::control_frameworks::router())
        .merge(routes::generation::router())
        .merge(routes::events::router());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new()
        .merge(health)
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: 200 once the record store answers.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.store.list_companies().await.map_err(|e| {
        tracing::warn!("readiness check failed: {e}");
        AppError::ServiceUnavailable("record store unreachable".into())
    })?;
    Ok("ready")
}
