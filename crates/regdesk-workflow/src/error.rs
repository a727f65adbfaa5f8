//! Workflow error type.

use regdesk_client::{StoreError, WebhookError};
use regdesk_core::ValidationError;

/// Errors from console workflows.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// A backend read or write failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A generation webhook failed.
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    /// Input rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The caller went away before anything was written.
    #[error("generation cancelled before any record was written")]
    Cancelled,
    /// The spreadsheet could not be produced.
    #[error("export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl WorkflowError {
    /// Whether the failure means a referenced row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }
}
