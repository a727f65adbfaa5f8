#![deny(missing_docs)]

//! # regdesk-core -- Foundational Types for regdesk
//!
//! This crate defines the records every other crate in the workspace passes
//! around: companies, their domain/activity/market tags, laws and
//! regulations, and control framework entries. It has no internal crate
//! dependencies: only `serde`, `serde_json`, `thiserror`, `chrono`, and
//! `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** You cannot pass a [`LawId`] where
//!    a [`TagId`] is expected.
//!
//! 2. **Backend-shaped records.** Field names match the hosted backend's
//!    columns (`id_company`, `id_laws_and_regulations`, ...) so records
//!    round-trip through the REST adapter without renaming.
//!
//! 3. **One listing engine.** Every paged list in the console goes through
//!    [`listing`], so search, facet filtering, and page clamping behave the
//!    same for laws, control frameworks, and companies.

pub mod entity;
pub mod error;
pub mod identity;
pub mod listing;

pub use entity::{
    Company, CompanyPatch, CompanyStatus, ControlFramework, ControlFrameworkPatch, LawPatch,
    LawRef, LawRegulation, NameRef, NewCompany, NewControlFramework, NewLaw, NewTag, Table, Tag,
    TagKind, TagPatch,
};
pub use error::ValidationError;
pub use identity::{CompanyId, ControlFrameworkId, LawId, TagId};
pub use listing::{Criteria, Facet, FacetFilter, ListState, Listable, Page, PAGE_SIZE};
