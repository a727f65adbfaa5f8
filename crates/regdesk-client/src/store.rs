//! # Record Store Adapter
//!
//! [`RecordStore`] is the single seam between the console and the hosted
//! backend. Every operation is one asynchronous request/response; a failure
//! comes back as a [`StoreError`] and nothing beyond what the backend already
//! committed has happened.
//!
//! Implementations:
//! - [`crate::rest::RestStore`]: the hosted backend over HTTP.
//! - [`crate::memory::MemoryStore`]: in-process tables for development and tests.
//! - [`crate::observed::ObservedStore`]: decorator that publishes change events.
//!
//! Lists scoped to a company come back newest first. Rows carrying foreign
//! keys come back with the joined display names filled in.

use async_trait::async_trait;
use regdesk_core::{
    Company, CompanyId, CompanyPatch, ControlFramework, ControlFrameworkId, ControlFrameworkPatch,
    LawId, LawPatch, LawRegulation, NewCompany, NewControlFramework, NewLaw, NewTag, Table, Tag,
    TagId, TagKind, TagPatch,
};

use crate::error::StoreError;

/// Result of replacing a company's laws.
#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    /// The rows now persisted for the company.
    pub inserted: Vec<LawRegulation>,
    /// How many previous rows were removed.
    pub removed: usize,
}

/// Typed access to the six backend tables.
///
/// The trait is object-safe so the console can hold an
/// `Arc<dyn RecordStore>` and swap the backend at startup.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // -- companies ------------------------------------------------------------

    /// All companies, newest first.
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError>;

    /// One company.
    async fn get_company(&self, id: CompanyId) -> Result<Company, StoreError>;

    /// Insert a company.
    async fn insert_company(&self, new: &NewCompany) -> Result<Company, StoreError>;

    /// Update a company.
    async fn update_company(
        &self,
        id: CompanyId,
        patch: &CompanyPatch,
    ) -> Result<Company, StoreError>;

    /// Delete a company permanently.
    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError>;

    // -- domains / activities / markets ---------------------------------------

    /// Tags of one kind, optionally scoped to a company, newest first.
    async fn list_tags(
        &self,
        kind: TagKind,
        company: Option<CompanyId>,
    ) -> Result<Vec<Tag>, StoreError>;

    /// One tag.
    async fn get_tag(&self, kind: TagKind, id: TagId) -> Result<Tag, StoreError>;

    /// Insert a tag.
    async fn insert_tag(&self, kind: TagKind, new: &NewTag) -> Result<Tag, StoreError>;

    /// Rename a tag.
    async fn update_tag(
        &self,
        kind: TagKind,
        id: TagId,
        patch: &TagPatch,
    ) -> Result<Tag, StoreError>;

    /// Delete a tag permanently.
    async fn delete_tag(&self, kind: TagKind, id: TagId) -> Result<(), StoreError>;

    // -- laws and regulations -------------------------------------------------

    /// Laws, optionally scoped to a company, newest first, with tag names.
    async fn list_laws(&self, company: Option<CompanyId>)
        -> Result<Vec<LawRegulation>, StoreError>;

    /// One law with tag names.
    async fn get_law(&self, id: LawId) -> Result<LawRegulation, StoreError>;

    /// Insert several laws in one request.
    async fn insert_laws(&self, rows: &[NewLaw]) -> Result<Vec<LawRegulation>, StoreError>;

    /// Update a law.
    async fn update_law(&self, id: LawId, patch: &LawPatch)
        -> Result<LawRegulation, StoreError>;

    /// Delete several laws in one request.
    async fn delete_laws(&self, ids: &[LawId]) -> Result<(), StoreError>;

    /// Insert one law.
    async fn insert_law(&self, row: &NewLaw) -> Result<LawRegulation, StoreError> {
        self.insert_laws(std::slice::from_ref(row))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(Table::Laws, "inserted row"))
    }

    /// Delete one law.
    async fn delete_law(&self, id: LawId) -> Result<(), StoreError> {
        self.delete_laws(&[id]).await
    }

    /// Replace every law of `company` with `rows`.
    ///
    /// The replacement rows are inserted first; the superseded rows are
    /// deleted only once the insert has committed. A failed insert leaves
    /// the previous laws in place. A failed delete leaves both sets, which
    /// the next generation run cleans up.
    ///
    /// Superseded means created no later than the newest inserted row, as
    /// listed after the insert. When two replaces overlap, the one that
    /// inserted last keeps its rows and the other's are removed.
    async fn replace_laws(
        &self,
        company: CompanyId,
        rows: &[NewLaw],
    ) -> Result<ReplaceOutcome, StoreError> {
        let inserted = if rows.is_empty() {
            Vec::new()
        } else {
            self.insert_laws(rows).await?
        };
        let cutoff = inserted.iter().map(|law| law.created_at).max();

        let superseded: Vec<LawId> = self
            .list_laws(Some(company))
            .await?
            .into_iter()
            .filter(|law| !inserted.iter().any(|new| new.id == law.id))
            .filter(|law| cutoff.map_or(true, |cutoff| law.created_at <= cutoff))
            .map(|law| law.id)
            .collect();

        if !superseded.is_empty() {
            if let Err(e) = self.delete_laws(&superseded).await {
                tracing::error!(
                    company = %company,
                    superseded = superseded.len(),
                    "replacement laws inserted but superseded rows were not removed: {e}"
                );
                return Err(e);
            }
        }

        Ok(ReplaceOutcome {
            inserted,
            removed: superseded.len(),
        })
    }

    // -- control framework ----------------------------------------------------

    /// Control framework entries, optionally scoped to a company, newest
    /// first, with tag and law names.
    async fn list_control_frameworks(
        &self,
        company: Option<CompanyId>,
    ) -> Result<Vec<ControlFramework>, StoreError>;

    /// One control framework entry with tag and law names.
    async fn get_control_framework(
        &self,
        id: ControlFrameworkId,
    ) -> Result<ControlFramework, StoreError>;

    /// Insert several entries in one request.
    async fn insert_control_frameworks(
        &self,
        rows: &[NewControlFramework],
    ) -> Result<Vec<ControlFramework>, StoreError>;

    /// Update an entry.
    async fn update_control_framework(
        &self,
        id: ControlFrameworkId,
        patch: &ControlFrameworkPatch,
    ) -> Result<ControlFramework, StoreError>;

    /// Delete an entry permanently.
    async fn delete_control_framework(&self, id: ControlFrameworkId) -> Result<(), StoreError>;

    /// Mark every unverified entry of `company` as verified. Returns how
    /// many rows changed.
    async fn verify_control_frameworks(&self, company: CompanyId) -> Result<usize, StoreError>;

    /// Insert one entry.
    async fn insert_control_framework(
        &self,
        row: &NewControlFramework,
    ) -> Result<ControlFramework, StoreError> {
        self.insert_control_frameworks(std::slice::from_ref(row))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(Table::ControlFrameworks, "inserted row"))
    }
}
