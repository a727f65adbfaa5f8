//! Local preconditions checked before a write leaves the process.
//!
//! - A company must keep at least one tag of each kind.
//! - Foreign keys on laws and control framework entries must reference
//!   records owned by the same company.

use regdesk_client::RecordStore;
use regdesk_core::{
    ControlFrameworkPatch, LawId, LawPatch, NewControlFramework, NewLaw, Tag, TagId, TagKind,
    ValidationError,
};

use crate::error::WorkflowError;
use crate::snapshot::CompanySnapshot;

fn ensure_not_last(remaining: usize, kind: TagKind) -> Result<(), ValidationError> {
    if remaining <= 1 {
        return Err(ValidationError::LastTagOfKind { kind });
    }
    Ok(())
}

/// Refuse to delete a tag of `kind` when it is the company's only one.
pub fn ensure_tag_deletable(snapshot: &CompanySnapshot, kind: TagKind) -> Result<(), ValidationError> {
    ensure_not_last(snapshot.tags(kind).len(), kind)
}

/// Delete a tag after checking it is not the last of its kind for its
/// company. The guard runs before any delete request is sent.
pub async fn delete_tag(
    store: &dyn RecordStore,
    kind: TagKind,
    id: TagId,
) -> Result<Tag, WorkflowError> {
    let tag = store.get_tag(kind, id).await?;
    let siblings = store.list_tags(kind, Some(tag.id_company)).await?;
    ensure_not_last(siblings.len(), kind)?;
    store.delete_tag(kind, id).await?;
    tracing::info!(company = %tag.id_company, kind = %kind, tag = %id, "tag deleted");
    Ok(tag)
}

/// Foreign keys a law or control framework write wants to set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    /// Domain reference.
    pub id_domain: Option<TagId>,
    /// Activity reference.
    pub id_activity: Option<TagId>,
    /// Market reference.
    pub id_market: Option<TagId>,
    /// Law reference.
    pub id_law: Option<LawId>,
}

impl From<&NewLaw> for Links {
    fn from(row: &NewLaw) -> Self {
        Self {
            id_domain: row.id_domain,
            id_activity: row.id_activity,
            id_market: row.id_market,
            id_law: None,
        }
    }
}

impl From<&LawPatch> for Links {
    fn from(patch: &LawPatch) -> Self {
        Self {
            id_domain: patch.id_domain.flatten(),
            id_activity: patch.id_activity.flatten(),
            id_market: patch.id_market.flatten(),
            id_law: None,
        }
    }
}

impl From<&NewControlFramework> for Links {
    fn from(row: &NewControlFramework) -> Self {
        Self {
            id_domain: row.id_domain,
            id_activity: row.id_activity,
            id_market: row.id_market,
            id_law: row.id_laws_and_regulations,
        }
    }
}

impl From<&ControlFrameworkPatch> for Links {
    fn from(patch: &ControlFrameworkPatch) -> Self {
        Self {
            id_domain: patch.id_domain.flatten(),
            id_activity: patch.id_activity.flatten(),
            id_market: patch.id_market.flatten(),
            id_law: patch.id_laws_and_regulations.flatten(),
        }
    }
}

/// Every set foreign key must name a record in `snapshot`.
pub fn check_links(snapshot: &CompanySnapshot, links: &Links) -> Result<(), ValidationError> {
    for kind in TagKind::ALL {
        let id = match kind {
            TagKind::Domain => links.id_domain,
            TagKind::Activity => links.id_activity,
            TagKind::Market => links.id_market,
        };
        if let Some(id) = id {
            if !snapshot.tags(kind).iter().any(|t| t.id == id) {
                return Err(ValidationError::CrossCompanyReference {
                    field: kind.foreign_key(),
                });
            }
        }
    }
    if let Some(id) = links.id_law {
        if !snapshot.laws.iter().any(|l| l.id == id) {
            return Err(ValidationError::CrossCompanyReference {
                field: "id_laws_and_regulations",
            });
        }
    }
    Ok(())
}
