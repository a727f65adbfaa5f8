//! # regdesk-workflow -- Console workflows over the record store
//!
//! The operations the console performs on behalf of a user, independent of
//! whether they arrive over HTTP or from the command line:
//!
//! - [`CompanySnapshot`]: the company detail aggregate, with targeted
//!   reloads driven by change notifications.
//! - [`guard`]: the last-tag rule and same-company foreign keys.
//! - [`Pipeline`]: laws and control framework generation, and the verify
//!   submit.
//! - [`export_control_framework`]: single-entry spreadsheet download.

pub mod error;
pub mod export;
pub mod generation;
pub mod guard;
pub mod pipeline;
pub mod snapshot;

pub use error::WorkflowError;
pub use export::{export_control_framework, Export};
pub use generation::{
    control_framework_request, expand_law, laws_request, resolve_control_framework,
};
pub use guard::{check_links, delete_tag, ensure_tag_deletable, Links};
pub use pipeline::{submit, GenerationReport, Pipeline};
pub use snapshot::CompanySnapshot;
