//! In-process implementation of [`RecordStore`].
//!
//! Used by the console when no backend is configured and throughout the
//! test suites. Behaves like the hosted backend where the console can see
//! the difference:
//!
//! - lists come back newest first;
//! - joined display names are filled in on every read;
//! - deleting a company cascades to its tags, laws, and control framework;
//! - deleting a tag or law nulls the foreign keys that pointed at it;
//! - inserting a row for an unknown company is rejected.
//!
//! All operations are synchronous under a `parking_lot` lock that is never
//! held across an `.await`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use regdesk_core::{
    Company, CompanyId, CompanyPatch, ControlFramework, ControlFrameworkId, ControlFrameworkPatch,
    LawId, LawPatch, LawRef, LawRegulation, NameRef, NewCompany, NewControlFramework, NewLaw,
    NewTag, Table, Tag, TagId, TagKind, TagPatch,
};

use crate::error::StoreError;
use crate::store::{RecordStore, ReplaceOutcome};

#[derive(Debug, Default)]
struct Tables {
    companies: Vec<Company>,
    domains: Vec<Tag>,
    activities: Vec<Tag>,
    markets: Vec<Tag>,
    laws: Vec<LawRegulation>,
    control_frameworks: Vec<ControlFramework>,
}

impl Tables {
    fn tags(&self, kind: TagKind) -> &Vec<Tag> {
        match kind {
            TagKind::Domain => &self.domains,
            TagKind::Activity => &self.activities,
            TagKind::Market => &self.markets,
        }
    }

    fn tags_mut(&mut self, kind: TagKind) -> &mut Vec<Tag> {
        match kind {
            TagKind::Domain => &mut self.domains,
            TagKind::Activity => &mut self.activities,
            TagKind::Market => &mut self.markets,
        }
    }

    fn require_company(&self, id: CompanyId) -> Result<(), StoreError> {
        if self.companies.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(StoreError::not_found(Table::Companies, id))
        }
    }

    fn tag_name(&self, kind: TagKind, id: Option<TagId>) -> Option<NameRef> {
        let id = id?;
        self.tags(kind)
            .iter()
            .find(|t| t.id == id)
            .map(|t| NameRef {
                name: t.name.clone(),
            })
    }

    fn join_law(&self, law: &LawRegulation) -> LawRegulation {
        let mut law = law.clone();
        law.domains = self.tag_name(TagKind::Domain, law.id_domain);
        law.activities = self.tag_name(TagKind::Activity, law.id_activity);
        law.markets = self.tag_name(TagKind::Market, law.id_market);
        law
    }

    fn join_control_framework(&self, cf: &ControlFramework) -> ControlFramework {
        let mut cf = cf.clone();
        cf.domains = self.tag_name(TagKind::Domain, cf.id_domain);
        cf.activities = self.tag_name(TagKind::Activity, cf.id_activity);
        cf.markets = self.tag_name(TagKind::Market, cf.id_market);
        cf.laws_and_regulations = cf.id_laws_and_regulations.and_then(|id| {
            self.laws.iter().find(|l| l.id == id).map(|l| LawRef {
                name: l.name.clone(),
                description: l.description.clone(),
                source: l.source.clone(),
            })
        });
        cf
    }

    fn new_law_row(&self, row: &NewLaw) -> Result<LawRegulation, StoreError> {
        row.validate()?;
        self.require_company(row.id_company)?;
        Ok(LawRegulation {
            id: LawId::new(),
            name: row.name.clone(),
            description: row.description.clone(),
            source: row.source.clone(),
            country: row.country.clone(),
            id_company: row.id_company,
            id_domain: row.id_domain,
            id_activity: row.id_activity,
            id_market: row.id_market,
            created_at: Utc::now(),
            updated_at: None,
            domains: None,
            activities: None,
            markets: None,
        })
    }

    /// Drop law rows and null out control framework links to them.
    fn remove_laws(&mut self, ids: &[LawId]) -> usize {
        let before = self.laws.len();
        self.laws.retain(|l| !ids.contains(&l.id));
        for cf in &mut self.control_frameworks {
            if cf.id_laws_and_regulations.is_some_and(|id| ids.contains(&id)) {
                cf.id_laws_and_regulations = None;
            }
        }
        before - self.laws.len()
    }
}

/// Newest first: rows are appended, so walk the vector backwards.
fn newest_first<'a, T: 'a>(rows: impl DoubleEndedIterator<Item = &'a T>) -> impl Iterator<Item = &'a T> {
    rows.rev()
}

/// Thread-safe, cloneable in-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        let tables = self.tables.read();
        Ok(newest_first(tables.companies.iter()).cloned().collect())
    }

    async fn get_company(&self, id: CompanyId) -> Result<Company, StoreError> {
        self.tables
            .read()
            .companies
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Table::Companies, id))
    }

    async fn insert_company(&self, new: &NewCompany) -> Result<Company, StoreError> {
        new.validate()?;
        let company = Company {
            id: CompanyId::new(),
            name: new.name.clone(),
            website: new.website.clone(),
            duns_number: new.duns_number.clone(),
            country: new.country.clone(),
            status: new.status,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.tables.write().companies.push(company.clone());
        Ok(company)
    }

    async fn update_company(
        &self,
        id: CompanyId,
        patch: &CompanyPatch,
    ) -> Result<Company, StoreError> {
        patch.validate()?;
        let mut tables = self.tables.write();
        let company = tables
            .companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found(Table::Companies, id))?;
        patch.apply(company);
        company.updated_at = Some(Utc::now());
        Ok(company.clone())
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        tables.require_company(id)?;
        tables.companies.retain(|c| c.id != id);
        for kind in TagKind::ALL {
            tables.tags_mut(kind).retain(|t| t.id_company != id);
        }
        tables.laws.retain(|l| l.id_company != id);
        tables.control_frameworks.retain(|cf| cf.id_company != id);
        Ok(())
    }

    async fn list_tags(
        &self,
        kind: TagKind,
        company: Option<CompanyId>,
    ) -> Result<Vec<Tag>, StoreError> {
        let tables = self.tables.read();
        Ok(newest_first(tables.tags(kind).iter())
            .filter(|t| company.map_or(true, |c| t.id_company == c))
            .cloned()
            .collect())
    }

    async fn get_tag(&self, kind: TagKind, id: TagId) -> Result<Tag, StoreError> {
        self.tables
            .read()
            .tags(kind)
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(kind.table(), id))
    }

    async fn insert_tag(&self, kind: TagKind, new: &NewTag) -> Result<Tag, StoreError> {
        new.validate()?;
        let mut tables = self.tables.write();
        tables.require_company(new.id_company)?;
        let tag = Tag {
            id: TagId::new(),
            name: new.name.clone(),
            id_company: new.id_company,
        };
        tables.tags_mut(kind).push(tag.clone());
        Ok(tag)
    }

    async fn update_tag(
        &self,
        kind: TagKind,
        id: TagId,
        patch: &TagPatch,
    ) -> Result<Tag, StoreError> {
        patch.validate()?;
        let mut tables = self.tables.write();
        let tag = tables
            .tags_mut(kind)
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::not_found(kind.table(), id))?;
        tag.name = patch.name.clone();
        Ok(tag.clone())
    }

    async fn delete_tag(&self, kind: TagKind, id: TagId) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let tags = tables.tags_mut(kind);
        let before = tags.len();
        tags.retain(|t| t.id != id);
        if tags.len() == before {
            return Err(StoreError::not_found(kind.table(), id));
        }

        let clear = |slot: &mut Option<TagId>| {
            if *slot == Some(id) {
                *slot = None;
            }
        };
        for law in &mut tables.laws {
            match kind {
                TagKind::Domain => clear(&mut law.id_domain),
                TagKind::Activity => clear(&mut law.id_activity),
                TagKind::Market => clear(&mut law.id_market),
            }
        }
        for cf in &mut tables.control_frameworks {
            match kind {
                TagKind::Domain => clear(&mut cf.id_domain),
                TagKind::Activity => clear(&mut cf.id_activity),
                TagKind::Market => clear(&mut cf.id_market),
            }
        }
        Ok(())
    }

    async fn list_laws(
        &self,
        company: Option<CompanyId>,
    ) -> Result<Vec<LawRegulation>, StoreError> {
        let tables = self.tables.read();
        Ok(newest_first(tables.laws.iter())
            .filter(|l| company.map_or(true, |c| l.id_company == c))
            .map(|l| tables.join_law(l))
            .collect())
    }

    async fn get_law(&self, id: LawId) -> Result<LawRegulation, StoreError> {
        let tables = self.tables.read();
        tables
            .laws
            .iter()
            .find(|l| l.id == id)
            .map(|l| tables.join_law(l))
            .ok_or_else(|| StoreError::not_found(Table::Laws, id))
    }

    async fn insert_laws(&self, rows: &[NewLaw]) -> Result<Vec<LawRegulation>, StoreError> {
        let mut tables = self.tables.write();
        let new_rows = rows
            .iter()
            .map(|row| tables.new_law_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        tables.laws.extend(new_rows.iter().cloned());
        Ok(new_rows.iter().map(|l| tables.join_law(l)).collect())
    }

    async fn update_law(
        &self,
        id: LawId,
        patch: &LawPatch,
    ) -> Result<LawRegulation, StoreError> {
        patch.validate()?;
        let mut tables = self.tables.write();
        let law = tables
            .laws
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| StoreError::not_found(Table::Laws, id))?;
        patch.apply(law);
        law.updated_at = Some(Utc::now());
        let law = law.clone();
        Ok(tables.join_law(&law))
    }

    async fn delete_laws(&self, ids: &[LawId]) -> Result<(), StoreError> {
        self.tables.write().remove_laws(ids);
        Ok(())
    }

    async fn delete_law(&self, id: LawId) -> Result<(), StoreError> {
        if self.tables.write().remove_laws(&[id]) == 0 {
            return Err(StoreError::not_found(Table::Laws, id));
        }
        Ok(())
    }

    /// Atomic: the old rows disappear and the new rows appear under one lock.
    async fn replace_laws(
        &self,
        company: CompanyId,
        rows: &[NewLaw],
    ) -> Result<ReplaceOutcome, StoreError> {
        let mut tables = self.tables.write();
        tables.require_company(company)?;
        let new_rows = rows
            .iter()
            .map(|row| tables.new_law_row(row))
            .collect::<Result<Vec<_>, _>>()?;

        let superseded: Vec<LawId> = tables
            .laws
            .iter()
            .filter(|l| l.id_company == company)
            .map(|l| l.id)
            .collect();
        let removed = tables.remove_laws(&superseded);
        tables.laws.extend(new_rows.iter().cloned());

        Ok(ReplaceOutcome {
            inserted: new_rows.iter().map(|l| tables.join_law(l)).collect(),
            removed,
        })
    }

    async fn list_control_frameworks(
        &self,
        company: Option<CompanyId>,
    ) -> Result<Vec<ControlFramework>, StoreError> {
        let tables = self.tables.read();
        Ok(newest_first(tables.control_frameworks.iter())
            .filter(|cf| company.map_or(true, |c| cf.id_company == c))
            .map(|cf| tables.join_control_framework(cf))
            .collect())
    }

    async fn get_control_framework(
        &self,
        id: ControlFrameworkId,
    ) -> Result<ControlFramework, StoreError> {
        let tables = self.tables.read();
        tables
            .control_frameworks
            .iter()
            .find(|cf| cf.id == id)
            .map(|cf| tables.join_control_framework(cf))
            .ok_or_else(|| StoreError::not_found(Table::ControlFrameworks, id))
    }

    async fn insert_control_frameworks(
        &self,
        rows: &[NewControlFramework],
    ) -> Result<Vec<ControlFramework>, StoreError> {
        let mut tables = self.tables.write();
        let now = Utc::now();
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            row.validate()?;
            tables.require_company(row.id_company)?;
            inserted.push(ControlFramework {
                id: ControlFrameworkId::new(),
                context: row.context.clone(),
                description: row.description.clone(),
                risk_management: row.risk_management.clone(),
                country_applied: row.country_applied.clone(),
                referral_source: row.referral_source.clone(),
                id_domain: row.id_domain,
                id_activity: row.id_activity,
                id_market: row.id_market,
                id_laws_and_regulations: row.id_laws_and_regulations,
                id_company: row.id_company,
                verified: row.verified,
                created_at: now,
                updated_at: Some(now),
                domains: None,
                activities: None,
                markets: None,
                laws_and_regulations: None,
            });
        }
        tables.control_frameworks.extend(inserted.iter().cloned());
        Ok(inserted
            .iter()
            .map(|cf| tables.join_control_framework(cf))
            .collect())
    }

    async fn update_control_framework(
        &self,
        id: ControlFrameworkId,
        patch: &ControlFrameworkPatch,
    ) -> Result<ControlFramework, StoreError> {
        patch.validate()?;
        let mut tables = self.tables.write();
        let cf = tables
            .control_frameworks
            .iter_mut()
            .find(|cf| cf.id == id)
            .ok_or_else(|| StoreError::not_found(Table::ControlFrameworks, id))?;
        patch.apply(cf);
        cf.updated_at = Some(Utc::now());
        let cf = cf.clone();
        Ok(tables.join_control_framework(&cf))
    }

    async fn delete_control_framework(&self, id: ControlFrameworkId) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let before = tables.control_frameworks.len();
        tables.control_frameworks.retain(|cf| cf.id != id);
        if tables.control_frameworks.len() == before {
            return Err(StoreError::not_found(Table::ControlFrameworks, id));
        }
        Ok(())
    }

    async fn verify_control_frameworks(&self, company: CompanyId) -> Result<usize, StoreError> {
        let mut tables = self.tables.write();
        let now = Utc::now();
        let mut changed = 0;
        for cf in tables
            .control_frameworks
            .iter_mut()
            .filter(|cf| cf.id_company == company && !cf.verified)
        {
            cf.verified = true;
            cf.updated_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }
}
