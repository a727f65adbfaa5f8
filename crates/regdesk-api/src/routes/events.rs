//! # Change Events API
//!
//! ## Endpoints
//!
//! - `GET /v1/companies/:id/events`: Server-Sent Events stream of committed
//!   changes to the company and its tags, laws, and control framework.
//!   Optional `tables` narrows the stream (comma-separated backend table
//!   names).
//!
//! Each SSE event is `change` (payload: the change) or `lagged` (some events
//! were dropped; the client should reload everything).

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use regdesk_client::{ChangeEvent, Interest, Notification};
use regdesk_core::{CompanyId, Table};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;

const TABLES: [Table; 6] = [
    Table::Companies,
    Table::Domains,
    Table::Activities,
    Table::Markets,
    Table::Laws,
    Table::ControlFrameworks,
];

/// Query parameters of the events stream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventsQuery {
    pub tables: Option<String>,
}

/// One SSE payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A committed change.
    Change(ChangeEvent),
    /// Events were dropped for this subscriber.
    Lagged { missed: u64 },
}

impl From<Notification> for StreamEvent {
    fn from(notification: Notification) -> Self {
        match notification {
            Notification::Change(event) => Self::Change(event),
            Notification::Lagged(missed) => Self::Lagged { missed },
        }
    }
}

impl StreamEvent {
    pub fn to_sse_event(&self) -> Result<Event, serde_json::Error> {
        let event_type = match self {
            Self::Change(_) => "change",
            Self::Lagged { .. } => "lagged",
        };
        let data = serde_json::to_string(self)?;
        Ok(Event::default().event(event_type).data(data))
    }
}

/// Parse a comma-separated table list. Empty means every table.
fn parse_tables(raw: Option<&str>) -> Result<Vec<Table>, AppError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            TABLES
                .iter()
                .copied()
                .find(|table| table.as_str() == name)
                .ok_or_else(|| AppError::BadRequest(format!("unknown table \"{name}\"")))
        })
        .collect()
}

/// Build the events router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/companies/:id/events", get(company_events))
}

/// GET /v1/companies/:id/events: live change stream.
async fn company_events(
    State(state): State<AppState>,
    Path(company): Path<CompanyId>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let query = extract_query(query)?;
    let tables = parse_tables(query.tables.as_deref())?;
    state.store.get_company(company).await?;

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(100);
    let cancel = CancellationToken::new();

    let closed = tx.clone();
    let stop = cancel.clone();
    tokio::spawn(async move {
        closed.closed().await;
        stop.cancel();
        tracing::debug!(company = %company, "event stream closed");
    });

    let interest = Interest::tables(tables).for_company(company);
    state.bus.watch(interest, cancel, move |notification| {
        let tx = tx.clone();
        async move {
            match StreamEvent::from(notification).to_sse_event() {
                Ok(event) => {
                    let _ = tx.send(Ok(event)).await;
                }
                Err(e) => tracing::error!("failed to encode change event: {e}"),
            }
        }
    });
    tracing::debug!(company = %company, "event stream opened");

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
