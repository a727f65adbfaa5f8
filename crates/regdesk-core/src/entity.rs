//! # Compliance Records
//!
//! Row types for the six backend tables, plus the insert and patch payloads
//! the console writes. Field names are the backend column names.
//!
//! Rows read with joins carry the related display names in embedded objects
//! (`domains`, `activities`, `markets`, `laws_and_regulations`), mirroring
//! the backend's `select=*,domains(name),...` embedding. Embedded objects are
//! never written back; insert and patch payloads only carry foreign keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{require, ValidationError};
use crate::identity::{CompanyId, ControlFrameworkId, LawId, TagId};

// -- Tables -------------------------------------------------------------------

/// The six backend tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// `companies`
    Companies,
    /// `domains`
    Domains,
    /// `activities`
    Activities,
    /// `markets`
    Markets,
    /// `laws_and_regulations`
    #[serde(rename = "laws_and_regulations")]
    Laws,
    /// `control_framework`
    #[serde(rename = "control_framework")]
    ControlFrameworks,
}

impl Table {
    /// Backend table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Companies => "companies",
            Self::Domains => "domains",
            Self::Activities => "activities",
            Self::Markets => "markets",
            Self::Laws => "laws_and_regulations",
            Self::ControlFrameworks => "control_framework",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three company-scoped categorical tag kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    /// Business domain.
    Domain,
    /// Business activity.
    Activity,
    /// Market the company operates in.
    Market,
}

impl TagKind {
    /// All tag kinds, in display order.
    pub const ALL: [TagKind; 3] = [TagKind::Domain, TagKind::Activity, TagKind::Market];

    /// Table that stores tags of this kind.
    pub fn table(&self) -> Table {
        match self {
            Self::Domain => Table::Domains,
            Self::Activity => Table::Activities,
            Self::Market => Table::Markets,
        }
    }

    /// Foreign-key column that references tags of this kind.
    pub fn foreign_key(&self) -> &'static str {
        match self {
            Self::Domain => "id_domain",
            Self::Activity => "id_activity",
            Self::Market => "id_market",
        }
    }

    /// Tag kind stored in `table`, if it is a tag table.
    pub fn from_table(table: Table) -> Option<Self> {
        match table {
            Table::Domains => Some(Self::Domain),
            Table::Activities => Some(Self::Activity),
            Table::Markets => Some(Self::Market),
            _ => None,
        }
    }
}

impl std::fmt::Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain => write!(f, "domain"),
            Self::Activity => write!(f, "activity"),
            Self::Market => write!(f, "market"),
        }
    }
}

// -- Embedded joins -----------------------------------------------------------

/// Embedded `{ "name": ... }` object for a joined domain/activity/market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRef {
    /// Display name of the referenced row.
    pub name: String,
}

/// Embedded summary of the law a control framework entry cites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawRef {
    /// Law name.
    pub name: String,
    /// Law description.
    #[serde(default)]
    pub description: String,
    /// Source citation.
    #[serde(default)]
    pub source: String,
}

/// Deserialize a present-but-null field as `Some(None)` so patches can
/// clear a foreign key, while an absent field stays `None`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// -- Companies ----------------------------------------------------------------

/// Company lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    /// Onboarded and in scope.
    #[default]
    Active,
    /// Kept for history only.
    Inactive,
    /// Awaiting onboarding.
    Pending,
    /// Forward-compatible catch-all for values this client does not know.
    #[serde(other)]
    Unknown,
}

impl CompanyStatus {
    /// Lowercase display value, as stored in the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

/// Row of the `companies` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Primary key.
    pub id: CompanyId,
    /// Company name.
    pub name: String,
    /// Public website URL.
    #[serde(default)]
    pub website: Option<String>,
    /// Dun & Bradstreet number.
    #[serde(default)]
    pub duns_number: Option<String>,
    /// Country of incorporation.
    #[serde(default)]
    pub country: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: CompanyStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time; `None` until the row is first edited.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCompany {
    /// Company name.
    pub name: String,
    /// Public website URL.
    #[serde(default)]
    pub website: Option<String>,
    /// Dun & Bradstreet number.
    #[serde(default)]
    pub duns_number: Option<String>,
    /// Country of incorporation.
    pub country: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: CompanyStatus,
}

impl NewCompany {
    /// Reject empty required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("country", &self.country)
    }
}

/// Partial update of a company. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyPatch {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New website; `Some(None)` clears it.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub website: Option<Option<String>>,
    /// New DUNS number; `Some(None)` clears it.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub duns_number: Option<Option<String>>,
    /// New country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CompanyStatus>,
}

impl CompanyPatch {
    /// Reject fields that are present but empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        if let Some(country) = &self.country {
            require("country", country)?;
        }
        Ok(())
    }

    /// Apply the patch to an in-memory row.
    pub fn apply(&self, company: &mut Company) {
        if let Some(name) = &self.name {
            company.name = name.clone();
        }
        if let Some(website) = &self.website {
            company.website = website.clone();
        }
        if let Some(duns) = &self.duns_number {
            company.duns_number = duns.clone();
        }
        if let Some(country) = &self.country {
            company.country = country.clone();
        }
        if let Some(status) = self.status {
            company.status = status;
        }
    }
}

// -- Domains / activities / markets ------------------------------------------

/// Row of the `domains`, `activities`, or `markets` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Primary key.
    pub id: TagId,
    /// Display name. Uniqueness is not enforced.
    pub name: String,
    /// Owning company.
    pub id_company: CompanyId,
}

/// Insert payload for a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTag {
    /// Display name.
    pub name: String,
    /// Owning company.
    pub id_company: CompanyId,
}

impl NewTag {
    /// Reject an empty name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }
}

/// Rename of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPatch {
    /// New display name.
    pub name: String,
}

impl TagPatch {
    /// Reject an empty name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }
}

// -- Laws and regulations -----------------------------------------------------

/// Row of the `laws_and_regulations` table, with joined tag names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawRegulation {
    /// Primary key.
    pub id: LawId,
    /// Law name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Source citation.
    #[serde(default)]
    pub source: String,
    /// Country the law applies in.
    #[serde(default)]
    pub country: String,
    /// Owning company.
    pub id_company: CompanyId,
    /// Domain scope; `None` applies to every domain.
    #[serde(default)]
    pub id_domain: Option<TagId>,
    /// Activity scope; `None` applies to every activity.
    #[serde(default)]
    pub id_activity: Option<TagId>,
    /// Market scope; `None` applies to every market.
    #[serde(default)]
    pub id_market: Option<TagId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Joined domain name.
    #[serde(default)]
    pub domains: Option<NameRef>,
    /// Joined activity name.
    #[serde(default)]
    pub activities: Option<NameRef>,
    /// Joined market name.
    #[serde(default)]
    pub markets: Option<NameRef>,
}

impl LawRegulation {
    /// Joined domain name, if the law is domain-scoped.
    pub fn domain_name(&self) -> Option<&str> {
        self.domains.as_ref().map(|n| n.name.as_str())
    }

    /// Joined activity name, if the law is activity-scoped.
    pub fn activity_name(&self) -> Option<&str> {
        self.activities.as_ref().map(|n| n.name.as_str())
    }

    /// Joined market name, if the law is market-scoped.
    pub fn market_name(&self) -> Option<&str> {
        self.markets.as_ref().map(|n| n.name.as_str())
    }
}

/// Insert payload for a law.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLaw {
    /// Law name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Source citation.
    #[serde(default)]
    pub source: String,
    /// Country the law applies in.
    #[serde(default)]
    pub country: String,
    /// Owning company.
    pub id_company: CompanyId,
    /// Domain scope.
    #[serde(default)]
    pub id_domain: Option<TagId>,
    /// Activity scope.
    #[serde(default)]
    pub id_activity: Option<TagId>,
    /// Market scope.
    #[serde(default)]
    pub id_market: Option<TagId>,
}

impl NewLaw {
    /// Reject an empty name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }
}

/// Partial update of a law.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawPatch {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// New country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// New domain scope; `Some(None)` makes the law domain-global.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_domain: Option<Option<TagId>>,
    /// New activity scope.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_activity: Option<Option<TagId>>,
    /// New market scope.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_market: Option<Option<TagId>>,
}

impl LawPatch {
    /// Reject a present but empty name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        Ok(())
    }

    /// Apply the patch to an in-memory row. Joined names are not touched.
    pub fn apply(&self, law: &mut LawRegulation) {
        if let Some(name) = &self.name {
            law.name = name.clone();
        }
        if let Some(description) = &self.description {
            law.description = description.clone();
        }
        if let Some(source) = &self.source {
            law.source = source.clone();
        }
        if let Some(country) = &self.country {
            law.country = country.clone();
        }
        if let Some(id) = self.id_domain {
            law.id_domain = id;
        }
        if let Some(id) = self.id_activity {
            law.id_activity = id;
        }
        if let Some(id) = self.id_market {
            law.id_market = id;
        }
    }
}

// -- Control framework --------------------------------------------------------

/// Row of the `control_framework` table, with joined names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlFramework {
    /// Primary key.
    pub id: ControlFrameworkId,
    /// Compliance context.
    #[serde(default)]
    pub context: String,
    /// Description of the control.
    #[serde(default)]
    pub description: String,
    /// Risk-management narrative.
    #[serde(default)]
    pub risk_management: String,
    /// Country the control applies in.
    #[serde(default)]
    pub country_applied: String,
    /// Referral source text.
    #[serde(default)]
    pub referral_source: String,
    /// Linked domain.
    #[serde(default)]
    pub id_domain: Option<TagId>,
    /// Linked activity.
    #[serde(default)]
    pub id_activity: Option<TagId>,
    /// Linked market.
    #[serde(default)]
    pub id_market: Option<TagId>,
    /// Linked law.
    #[serde(default)]
    pub id_laws_and_regulations: Option<LawId>,
    /// Owning company.
    pub id_company: CompanyId,
    /// Set once the entry passed the submit step.
    #[serde(default)]
    pub verified: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Joined domain name.
    #[serde(default)]
    pub domains: Option<NameRef>,
    /// Joined activity name.
    #[serde(default)]
    pub activities: Option<NameRef>,
    /// Joined market name.
    #[serde(default)]
    pub markets: Option<NameRef>,
    /// Joined law summary.
    #[serde(default)]
    pub laws_and_regulations: Option<LawRef>,
}

impl ControlFramework {
    /// Joined domain name.
    pub fn domain_name(&self) -> Option<&str> {
        self.domains.as_ref().map(|n| n.name.as_str())
    }

    /// Joined activity name.
    pub fn activity_name(&self) -> Option<&str> {
        self.activities.as_ref().map(|n| n.name.as_str())
    }

    /// Joined market name.
    pub fn market_name(&self) -> Option<&str> {
        self.markets.as_ref().map(|n| n.name.as_str())
    }

    /// Joined law name.
    pub fn law_name(&self) -> Option<&str> {
        self.laws_and_regulations.as_ref().map(|l| l.name.as_str())
    }
}

/// Insert payload for a control framework entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewControlFramework {
    /// Compliance context.
    pub context: String,
    /// Description of the control.
    #[serde(default)]
    pub description: String,
    /// Risk-management narrative.
    #[serde(default)]
    pub risk_management: String,
    /// Country the control applies in.
    #[serde(default)]
    pub country_applied: String,
    /// Referral source text.
    #[serde(default)]
    pub referral_source: String,
    /// Linked domain.
    #[serde(default)]
    pub id_domain: Option<TagId>,
    /// Linked activity.
    #[serde(default)]
    pub id_activity: Option<TagId>,
    /// Linked market.
    #[serde(default)]
    pub id_market: Option<TagId>,
    /// Linked law.
    #[serde(default)]
    pub id_laws_and_regulations: Option<LawId>,
    /// Owning company.
    pub id_company: CompanyId,
    /// Always `false` on insert; only the submit step sets it.
    #[serde(default)]
    pub verified: bool,
}

impl NewControlFramework {
    /// Reject an empty context.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("context", &self.context)
    }
}

/// Partial update of a control framework entry.
///
/// There is deliberately no `verified` field: the flag only moves from
/// `false` to `true`, through the bulk submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFrameworkPatch {
    /// New context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New risk-management narrative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_management: Option<String>,
    /// New country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_applied: Option<String>,
    /// New referral source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_source: Option<String>,
    /// New domain link; `Some(None)` clears it.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_domain: Option<Option<TagId>>,
    /// New activity link.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_activity: Option<Option<TagId>>,
    /// New market link.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_market: Option<Option<TagId>>,
    /// New law link.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_laws_and_regulations: Option<Option<LawId>>,
}

impl ControlFrameworkPatch {
    /// Reject a present but empty context.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(context) = &self.context {
            require("context", context)?;
        }
        Ok(())
    }

    /// Apply the patch to an in-memory row. Joined names are not touched.
    pub fn apply(&self, cf: &mut ControlFramework) {
        if let Some(v) = &self.context {
            cf.context = v.clone();
        }
        if let Some(v) = &self.description {
            cf.description = v.clone();
        }
        if let Some(v) = &self.risk_management {
            cf.risk_management = v.clone();
        }
        if let Some(v) = &self.country_applied {
            cf.country_applied = v.clone();
        }
        if let Some(v) = &self.referral_source {
            cf.referral_source = v.clone();
        }
        if let Some(id) = self.id_domain {
            cf.id_domain = id;
        }
        if let Some(id) = self.id_activity {
            cf.id_activity = id;
        }
        if let Some(id) = self.id_market {
            cf.id_market = id;
        }
        if let Some(id) = self.id_laws_and_regulations {
            cf.id_laws_and_regulations = id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn law_row_parses_backend_join_shape() {
        let row = json!({
            "id": "550e8400-e29b-41d4-a716-446655440001",
            "name": "GDPR",
            "description": "Data protection",
            "source": "EUR-Lex",
            "country": "EU",
            "id_company": "550e8400-e29b-41d4-a716-446655440000",
            "id_domain": "550e8400-e29b-41d4-a716-446655440002",
            "id_activity": null,
            "id_market": null,
            "created_at": "2026-01-15T12:00:00Z",
            "domains": { "name": "Finance" },
            "activities": null,
            "markets": null
        });
        let law: LawRegulation = serde_json::from_value(row).unwrap();
        assert_eq!(law.domain_name(), Some("Finance"));
        assert_eq!(law.activity_name(), None);
        assert!(law.id_activity.is_none());
    }

    #[test]
    fn control_framework_defaults_verified_false() {
        let row = json!({
            "id": "550e8400-e29b-41d4-a716-446655440003",
            "context": "KYC",
            "id_company": "550e8400-e29b-41d4-a716-446655440000",
            "created_at": "2026-01-15T12:00:00Z"
        });
        let cf: ControlFramework = serde_json::from_value(row).unwrap();
        assert!(!cf.verified);
        assert!(cf.law_name().is_none());
    }

    #[test]
    fn unknown_company_status_is_tolerated() {
        let status: CompanyStatus = serde_json::from_value(json!("archived")).unwrap();
        assert_eq!(status, CompanyStatus::Unknown);
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: LawPatch = serde_json::from_value(json!({ "id_domain": null })).unwrap();
        assert_eq!(patch.id_domain, Some(None));
        assert_eq!(patch.id_market, None);

        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, json!({ "id_domain": null }));
    }

    #[test]
    fn new_company_requires_name_and_country() {
        let mut company = NewCompany {
            name: "Acme".into(),
            website: None,
            duns_number: None,
            country: String::new(),
            status: CompanyStatus::Active,
        };
        assert_eq!(
            company.validate(),
            Err(ValidationError::EmptyField { field: "country" })
        );
        company.country = "US".into();
        assert!(company.validate().is_ok());
    }

    #[test]
    fn tag_kind_tables_and_keys() {
        assert_eq!(TagKind::Activity.table(), Table::Activities);
        assert_eq!(TagKind::Market.foreign_key(), "id_market");
        assert_eq!(TagKind::from_table(Table::Domains), Some(TagKind::Domain));
        assert_eq!(TagKind::from_table(Table::Laws), None);
        assert_eq!(Table::ControlFrameworks.as_str(), "control_framework");
    }

    #[test]
    fn control_framework_patch_applies_links() {
        let law = LawId::new();
        let mut cf = ControlFramework {
            id: ControlFrameworkId::new(),
            context: "old".into(),
            description: String::new(),
            risk_management: String::new(),
            country_applied: String::new(),
            referral_source: String::new(),
            id_domain: Some(TagId::new()),
            id_activity: None,
            id_market: None,
            id_laws_and_regulations: None,
            id_company: CompanyId::new(),
            verified: false,
            created_at: Utc::now(),
            updated_at: None,
            domains: None,
            activities: None,
            markets: None,
            laws_and_regulations: None,
        };
        let patch = ControlFrameworkPatch {
            context: Some("new".into()),
            id_domain: Some(None),
            id_laws_and_regulations: Some(Some(law)),
            ..Default::default()
        };
        patch.apply(&mut cf);
        assert_eq!(cf.context, "new");
        assert!(cf.id_domain.is_none());
        assert_eq!(cf.id_laws_and_regulations, Some(law));
    }
}
