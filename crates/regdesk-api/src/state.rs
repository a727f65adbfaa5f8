//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! - **store**: the record store, wrapped in an [`ObservedStore`] so every
//!   write reaches [`AppState::bus`].
//! - **bus**: change notifications, streamed to clients by the events route.
//! - **generator**: the generation webhooks. Absent means the generation
//!   endpoints return 503.

use std::sync::Arc;

use regdesk_client::{
    ChangeBus, ClientConfig, GenerationClient, Generator, MemoryStore, ObservedStore,
    RecordStore, RestStore, StoreError, WebhookError,
};
use regdesk_workflow::Pipeline;

use crate::error::AppError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Record store. Writes through it publish on `bus`.
    pub store: Arc<dyn RecordStore>,
    /// Change notifications.
    pub bus: ChangeBus,
    /// Generation webhooks, when configured.
    pub generator: Option<Arc<dyn Generator>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bus", &self.bus)
            .field("generator", &self.generator.is_some())
            .finish_non_exhaustive()
    }
}

/// Failure assembling state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The backend client could not be built.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The webhook client could not be built.
    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

impl AppState {
    /// Wrap `store` so its writes are observed, and attach `generator`.
    pub fn new<S>(store: S, generator: Option<Arc<dyn Generator>>) -> Self
    where
        S: RecordStore + 'static,
    {
        let bus = ChangeBus::default();
        Self {
            store: Arc::new(ObservedStore::new(store, bus.clone())),
            bus,
            generator,
        }
    }

    /// Empty in-memory tables and no generator.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), None)
    }

    /// Connect to the configured backend and webhooks.
    pub fn from_config(config: &ClientConfig) -> Result<Self, StateError> {
        let store = RestStore::new(&config.backend)?;
        let generator = match &config.webhooks {
            Some(webhooks) => {
                Some(Arc::new(GenerationClient::new(webhooks)?) as Arc<dyn Generator>)
            }
            None => None,
        };
        Ok(Self::new(store, generator))
    }

    /// A generation pipeline, or 503 when the webhooks are not configured.
    pub fn pipeline(&self) -> Result<Pipeline, AppError> {
        let generator = self.generator.clone().ok_or_else(|| {
            AppError::ServiceUnavailable(
                "generation webhooks are not configured; set REGDESK_LAWS_WEBHOOK_URL \
                 and REGDESK_CONTROLS_WEBHOOK_URL"
                    .into(),
            )
        })?;
        Ok(Pipeline::new(self.store.clone(), generator))
    }
}
