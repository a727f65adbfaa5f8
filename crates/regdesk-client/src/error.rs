//! Record store and webhook error types.

use regdesk_core::{Table, ValidationError};

/// Errors from record store calls.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Backend returned a non-2xx status.
    #[error("backend {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// No row with this identifier.
    #[error("{table} row {id} not found")]
    NotFound { table: Table, id: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    /// Payload rejected before any request was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl StoreError {
    /// A missing-row error for `table`.
    pub fn not_found(table: Table, id: impl ToString) -> Self {
        Self::NotFound {
            table,
            id: id.to_string(),
        }
    }

    /// Whether the failure means the row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors from generation webhook calls.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// HTTP transport error, including timeouts.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Webhook returned a non-2xx status.
    #[error("webhook {endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response body did not match the expected shape.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
