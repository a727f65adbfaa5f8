//! [`RecordStore`] decorator that publishes a [`ChangeEvent`] after every
//! successful mutation. Reads pass straight through. Failed writes publish
//! nothing.
//!
//! Every event names the owning company. Deletes look the row up first,
//! since the backend no longer has it afterwards.

use async_trait::async_trait;
use regdesk_core::{
    Company, CompanyId, CompanyPatch, ControlFramework, ControlFrameworkId, ControlFrameworkPatch,
    LawId, LawPatch, LawRegulation, NewCompany, NewControlFramework, NewLaw, NewTag, Table, Tag,
    TagId, TagKind, TagPatch,
};

use crate::error::StoreError;
use crate::events::{ChangeBus, ChangeEvent, ChangeOp};
use crate::store::{RecordStore, ReplaceOutcome};

/// Wraps a store and announces its writes on a [`ChangeBus`].
#[derive(Debug, Clone)]
pub struct ObservedStore<S> {
    inner: S,
    bus: ChangeBus,
}

impl<S: RecordStore> ObservedStore<S> {
    /// Wrap `inner`, publishing on `bus`.
    pub fn new(inner: S, bus: ChangeBus) -> Self {
        Self { inner, bus }
    }

    /// The bus changes are published on.
    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn emit(&self, table: Table, company: Option<CompanyId>, op: ChangeOp, count: usize) {
        if count > 0 {
            self.bus.publish(ChangeEvent {
                table,
                company,
                op,
                count,
            });
        }
    }

    /// Publish one event per company touched by a batch write.
    fn emit_per_company(
        &self,
        table: Table,
        op: ChangeOp,
        companies: impl IntoIterator<Item = CompanyId>,
    ) {
        let mut counts: Vec<(CompanyId, usize)> = Vec::new();
        for company in companies {
            match counts.iter_mut().find(|(c, _)| *c == company) {
                Some((_, n)) => *n += 1,
                None => counts.push((company, 1)),
            }
        }
        for (company, count) in counts {
            self.emit(table, Some(company), op, count);
        }
    }

    /// Owners of the laws in `ids` that still exist.
    async fn law_owners(&self, ids: &[LawId]) -> Result<Vec<CompanyId>, StoreError> {
        let mut owners = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.inner.get_law(id).await {
                Ok(law) => owners.push(law.id_company),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(owners)
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for ObservedStore<S> {
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        self.inner.list_companies().await
    }

    async fn get_company(&self, id: CompanyId) -> Result<Company, StoreError> {
        self.inner.get_company(id).await
    }

    async fn insert_company(&self, new: &NewCompany) -> Result<Company, StoreError> {
        let company = self.inner.insert_company(new).await?;
        self.emit(Table::Companies, Some(company.id), ChangeOp::Insert, 1);
        Ok(company)
    }

    async fn update_company(
        &self,
        id: CompanyId,
        patch: &CompanyPatch,
    ) -> Result<Company, StoreError> {
        let company = self.inner.update_company(id, patch).await?;
        self.emit(Table::Companies, Some(id), ChangeOp::Update, 1);
        Ok(company)
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
        self.inner.delete_company(id).await?;
        self.emit(Table::Companies, Some(id), ChangeOp::Delete, 1);
        Ok(())
    }

    async fn list_tags(
        &self,
        kind: TagKind,
        company: Option<CompanyId>,
    ) -> Result<Vec<Tag>, StoreError> {
        self.inner.list_tags(kind, company).await
    }

    async fn get_tag(&self, kind: TagKind, id: TagId) -> Result<Tag, StoreError> {
        self.inner.get_tag(kind, id).await
    }

    async fn insert_tag(&self, kind: TagKind, new: &NewTag) -> Result<Tag, StoreError> {
        let tag = self.inner.insert_tag(kind, new).await?;
        self.emit(kind.table(), Some(tag.id_company), ChangeOp::Insert, 1);
        Ok(tag)
    }

    async fn update_tag(
        &self,
        kind: TagKind,
        id: TagId,
        patch: &TagPatch,
    ) -> Result<Tag, StoreError> {
        let tag = self.inner.update_tag(kind, id, patch).await?;
        self.emit(kind.table(), Some(tag.id_company), ChangeOp::Update, 1);
        Ok(tag)
    }

    async fn delete_tag(&self, kind: TagKind, id: TagId) -> Result<(), StoreError> {
        let owner = self.inner.get_tag(kind, id).await?.id_company;
        self.inner.delete_tag(kind, id).await?;
        self.emit(kind.table(), Some(owner), ChangeOp::Delete, 1);
        Ok(())
    }

    async fn list_laws(
        &self,
        company: Option<CompanyId>,
    ) -> Result<Vec<LawRegulation>, StoreError> {
        self.inner.list_laws(company).await
    }

    async fn get_law(&self, id: LawId) -> Result<LawRegulation, StoreError> {
        self.inner.get_law(id).await
    }

    async fn insert_laws(&self, rows: &[NewLaw]) -> Result<Vec<LawRegulation>, StoreError> {
        let inserted = self.inner.insert_laws(rows).await?;
        self.emit_per_company(
            Table::Laws,
            ChangeOp::Insert,
            inserted.iter().map(|l| l.id_company),
        );
        Ok(inserted)
    }

    async fn update_law(
        &self,
        id: LawId,
        patch: &LawPatch,
    ) -> Result<LawRegulation, StoreError> {
        let law = self.inner.update_law(id, patch).await?;
        self.emit(Table::Laws, Some(law.id_company), ChangeOp::Update, 1);
        Ok(law)
    }

    async fn delete_laws(&self, ids: &[LawId]) -> Result<(), StoreError> {
        let owners = self.law_owners(ids).await?;
        self.inner.delete_laws(ids).await?;
        self.emit_per_company(Table::Laws, ChangeOp::Delete, owners);
        Ok(())
    }

    async fn delete_law(&self, id: LawId) -> Result<(), StoreError> {
        let owner = self.inner.get_law(id).await?.id_company;
        self.inner.delete_law(id).await?;
        self.emit(Table::Laws, Some(owner), ChangeOp::Delete, 1);
        Ok(())
    }

    async fn replace_laws(
        &self,
        company: CompanyId,
        rows: &[NewLaw],
    ) -> Result<ReplaceOutcome, StoreError> {
        // Delegate so the inner store keeps its own atomicity guarantees,
        // then announce the net effect once.
        let outcome = self.inner.replace_laws(company, rows).await?;
        self.emit(Table::Laws, Some(company), ChangeOp::Delete, outcome.removed);
        self.emit(
            Table::Laws,
            Some(company),
            ChangeOp::Insert,
            outcome.inserted.len(),
        );
        Ok(outcome)
    }

    async fn list_control_frameworks(
        &self,
        company: Option<CompanyId>,
    ) -> Result<Vec<ControlFramework>, StoreError> {
        self.inner.list_control_frameworks(company).await
    }

    async fn get_control_framework(
        &self,
        id: ControlFrameworkId,
    ) -> Result<ControlFramework, StoreError> {
        self.inner.get_control_framework(id).await
    }

    async fn insert_control_frameworks(
        &self,
        rows: &[NewControlFramework],
    ) -> Result<Vec<ControlFramework>, StoreError> {
        let inserted = self.inner.insert_control_frameworks(rows).await?;
        self.emit_per_company(
            Table::ControlFrameworks,
            ChangeOp::Insert,
            inserted.iter().map(|cf| cf.id_company),
        );
        Ok(inserted)
    }

    async fn update_control_framework(
        &self,
        id: ControlFrameworkId,
        patch: &ControlFrameworkPatch,
    ) -> Result<ControlFramework, StoreError> {
        let cf = self.inner.update_control_framework(id, patch).await?;
        self.emit(
            Table::ControlFrameworks,
            Some(cf.id_company),
            ChangeOp::Update,
            1,
        );
        Ok(cf)
    }

    async fn delete_control_framework(&self, id: ControlFrameworkId) -> Result<(), StoreError> {
        let owner = self.inner.get_control_framework(id).await?.id_company;
        self.inner.delete_control_framework(id).await?;
        self.emit(Table::ControlFrameworks, Some(owner), ChangeOp::Delete, 1);
        Ok(())
    }

    async fn verify_control_frameworks(&self, company: CompanyId) -> Result<usize, StoreError> {
        let changed = self.inner.verify_control_frameworks(company).await?;
        self.emit(
            Table::ControlFrameworks,
            Some(company),
            ChangeOp::Update,
            changed,
        );
        Ok(changed)
    }
}
