//! # Company Snapshot
//!
//! Everything the company detail view shows, loaded in one go: the company
//! row, its domains, activities, markets, laws, and control framework.
//!
//! The snapshot is the single source of names for request construction and
//! response reconciliation in the generation pipeline, so the pipeline
//! always reconciles against the same state it described to the webhook.

use regdesk_client::{RecordStore, StoreError};
use regdesk_core::{Company, CompanyId, ControlFramework, LawRegulation, Table, Tag, TagKind};
use serde::Serialize;

/// One company and all its dependent records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanySnapshot {
    /// The company row.
    pub company: Company,
    /// Business domains, newest first.
    pub domains: Vec<Tag>,
    /// Business activities, newest first.
    pub activities: Vec<Tag>,
    /// Markets, newest first.
    pub markets: Vec<Tag>,
    /// Laws and regulations with joined tag names, newest first.
    pub laws: Vec<LawRegulation>,
    /// Control framework entries with joined names, newest first.
    pub control_frameworks: Vec<ControlFramework>,
}

impl CompanySnapshot {
    /// Load the company and its six lists concurrently.
    pub async fn load(store: &dyn RecordStore, company: CompanyId) -> Result<Self, StoreError> {
        let (company_row, domains, activities, markets, laws, control_frameworks) = tokio::try_join!(
            store.get_company(company),
            store.list_tags(TagKind::Domain, Some(company)),
            store.list_tags(TagKind::Activity, Some(company)),
            store.list_tags(TagKind::Market, Some(company)),
            store.list_laws(Some(company)),
            store.list_control_frameworks(Some(company)),
        )?;
        tracing::debug!(
            company = %company,
            laws = laws.len(),
            control_frameworks = control_frameworks.len(),
            "company snapshot loaded"
        );
        Ok(Self {
            company: company_row,
            domains,
            activities,
            markets,
            laws,
            control_frameworks,
        })
    }

    /// Identifier of the snapshot's company.
    pub fn id(&self) -> CompanyId {
        self.company.id
    }

    /// Tags of one kind.
    pub fn tags(&self, kind: TagKind) -> &[Tag] {
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

    /// Unique tag names of one kind, first occurrence wins.
    pub fn tag_names(&self, kind: TagKind) -> Vec<String> {
        unique(self.tags(kind).iter().map(|t| t.name.as_str()))
    }

    /// First tag of `kind` whose name equals `name` exactly.
    pub fn find_tag(&self, kind: TagKind, name: &str) -> Option<&Tag> {
        self.tags(kind).iter().find(|t| t.name == name)
    }

    /// First law whose name equals `name` exactly.
    pub fn find_law(&self, name: &str) -> Option<&LawRegulation> {
        self.laws.iter().find(|l| l.name == name)
    }

    /// Refresh what a change to `table` can have made stale.
    ///
    /// Tag and law rows are embedded by name in the lists that reference
    /// them, so a change to a tag table also refreshes laws and control
    /// framework, and a change to laws also refreshes control framework.
    pub async fn reload(&mut self, store: &dyn RecordStore, table: Table) -> Result<(), StoreError> {
        let company = self.id();
        tracing::debug!(company = %company, table = %table, "reloading snapshot");
        match table {
            Table::Companies => {
                self.company = store.get_company(company).await?;
            }
            Table::Domains | Table::Activities | Table::Markets => {
                let kind = match TagKind::from_table(table) {
                    Some(kind) => kind,
                    None => return Ok(()),
                };
                let (tags, laws, control_frameworks) = tokio::try_join!(
                    store.list_tags(kind, Some(company)),
                    store.list_laws(Some(company)),
                    store.list_control_frameworks(Some(company)),
                )?;
                *self.tags_mut(kind) = tags;
                self.laws = laws;
                self.control_frameworks = control_frameworks;
            }
            Table::Laws => {
                let (laws, control_frameworks) = tokio::try_join!(
                    store.list_laws(Some(company)),
                    store.list_control_frameworks(Some(company)),
                )?;
                self.laws = laws;
                self.control_frameworks = control_frameworks;
            }
            Table::ControlFrameworks => {
                self.control_frameworks = store.list_control_frameworks(Some(company)).await?;
            }
        }
        Ok(())
    }

    /// Reload everything, e.g. after missed change notifications.
    pub async fn reload_all(&mut self, store: &dyn RecordStore) -> Result<(), StoreError> {
        *self = Self::load(store, self.id()).await?;
        Ok(())
    }
}

/// Deduplicate names keeping first-seen order. Blank names are dropped.
pub(crate) fn unique<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !name.trim().is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}
