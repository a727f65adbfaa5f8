//! # regdesk-client -- Backend and webhook access for the compliance console
//!
//! Everything that leaves the process goes through this crate:
//! - **Records** via the hosted relational backend ([`RestStore`]), or the
//!   in-process [`MemoryStore`] when no backend is configured.
//! - **Generation** via the laws and control-framework webhooks
//!   ([`GenerationClient`]).
//! - **Change notifications** via the in-process [`ChangeBus`], fed by
//!   [`ObservedStore`].
//!
//! ## Backend Path Convention
//!
//! Tables are exposed as `{backend_url}/rest/v1/{table}` with PostgREST
//! filters (`id=eq.{id}`, `id_company=eq.{id}`, `id=in.(...)`), joins in
//! the `select` parameter, and `order=created_at.desc`.

pub mod config;
pub mod error;
pub mod events;
pub mod memory;
pub mod observed;
pub mod rest;
pub mod store;
pub mod webhooks;

pub use config::{BackendConfig, ClientConfig, ConfigError, WebhookConfig};
pub use error::{StoreError, WebhookError};
pub use events::{ChangeBus, ChangeEvent, ChangeOp, Interest, Notification, Subscription};
pub use memory::MemoryStore;
pub use observed::ObservedStore;
pub use rest::RestStore;
pub use store::{RecordStore, ReplaceOutcome};
pub use webhooks::{
    ControlFrameworkRequest, ControlFrameworkResponse, GeneratedControl, GeneratedLaw,
    GenerationClient, Generator, LawSummary, LawsRequest, LawsResponse, OneOrMany,
};
