//! # Request Construction and Response Reconciliation
//!
//! Pure functions between a [`CompanySnapshot`] and the webhook wire types.
//!
//! ## Laws
//!
//! Every returned law names its domains, activities, and markets. Each axis
//! resolves to the company tags with exactly those names. An axis where no
//! name matches is a wildcard: the law is expanded across every tag of that
//! axis, one row per combination. An axis for which the company has no tags
//! at all stays null.
//!
//! ## Control framework
//!
//! Each returned control resolves one domain, activity, market, and law by
//! exact name. Nothing is expanded: an unresolved reference is stored as
//! null.

use regdesk_client::{
    ControlFrameworkRequest, GeneratedControl, GeneratedLaw, LawSummary, LawsRequest, OneOrMany,
};
use regdesk_core::{LawId, NewControlFramework, NewLaw, TagId, TagKind};

use crate::snapshot::{unique, CompanySnapshot};

/// Describe the company to the laws webhook.
pub fn laws_request(snapshot: &CompanySnapshot) -> LawsRequest {
    LawsRequest {
        website_url: snapshot.company.website.clone().unwrap_or_default(),
        company_name: snapshot.company.name.clone(),
        business_domains: snapshot.tag_names(TagKind::Domain),
        activities: snapshot.tag_names(TagKind::Activity),
        markets: snapshot.tag_names(TagKind::Market),
    }
}

/// Describe the company and its current laws to the control-framework
/// webhook. Domains and activities include those named only by laws.
pub fn control_framework_request(snapshot: &CompanySnapshot) -> ControlFrameworkRequest {
    let domains = snapshot
        .domains
        .iter()
        .map(|t| t.name.as_str())
        .chain(snapshot.laws.iter().filter_map(|l| l.domain_name()));
    let activities = snapshot
        .activities
        .iter()
        .map(|t| t.name.as_str())
        .chain(snapshot.laws.iter().filter_map(|l| l.activity_name()));

    ControlFrameworkRequest {
        website_url: snapshot.company.website.clone().unwrap_or_default(),
        company_name: snapshot.company.name.clone(),
        business_domains: unique(domains),
        activities: unique(activities),
        markets: snapshot.tag_names(TagKind::Market),
        laws_and_regulations: snapshot
            .laws
            .iter()
            .map(|law| LawSummary {
                name: law.name.clone(),
                description: law.description.clone(),
                country: law.country.clone(),
                source: law.source.clone(),
                business_domain: law.domain_name().map(str::to_string),
                activity: law.activity_name().map(str::to_string),
            })
            .collect(),
    }
}

/// Candidate values for one axis of a generated law.
fn law_axis(snapshot: &CompanySnapshot, kind: TagKind, names: &OneOrMany) -> Vec<Option<TagId>> {
    let tags = snapshot.tags(kind);
    if tags.is_empty() {
        return vec![None];
    }
    let mut matched: Vec<Option<TagId>> = Vec::new();
    for name in names.names() {
        for tag in tags.iter().filter(|t| &t.name == name) {
            if !matched.contains(&Some(tag.id)) {
                matched.push(Some(tag.id));
            }
        }
    }
    if matched.is_empty() {
        tags.iter().map(|t| Some(t.id)).collect()
    } else {
        matched
    }
}

/// Rows to insert for one generated law. Empty when the item has no name.
pub fn expand_law(item: &GeneratedLaw, snapshot: &CompanySnapshot) -> Vec<NewLaw> {
    if item.name.trim().is_empty() {
        tracing::warn!(company = %snapshot.id(), "dropping generated law without a name");
        return Vec::new();
    }
    let country = match item.country.as_deref().map(str::trim) {
        Some(country) if !country.is_empty() => country.to_string(),
        _ => snapshot.company.country.clone(),
    };

    let domains = law_axis(snapshot, TagKind::Domain, &item.business_domains);
    let activities = law_axis(snapshot, TagKind::Activity, &item.activities);
    let markets = law_axis(snapshot, TagKind::Market, &item.markets);

    let mut rows = Vec::with_capacity(domains.len() * activities.len() * markets.len());
    for &id_domain in &domains {
        for &id_activity in &activities {
            for &id_market in &markets {
                rows.push(NewLaw {
                    name: item.name.clone(),
                    description: item.description.clone(),
                    source: item.source.clone(),
                    country: country.clone(),
                    id_company: snapshot.id(),
                    id_domain,
                    id_activity,
                    id_market,
                });
            }
        }
    }
    rows
}

fn resolve_tag(snapshot: &CompanySnapshot, kind: TagKind, names: &OneOrMany) -> Option<TagId> {
    names
        .names()
        .iter()
        .find_map(|name| snapshot.find_tag(kind, name))
        .map(|t| t.id)
}

fn resolve_law(snapshot: &CompanySnapshot, names: &OneOrMany) -> Option<LawId> {
    names
        .names()
        .iter()
        .find_map(|name| snapshot.find_law(name))
        .map(|l| l.id)
}

/// Row to insert for one generated control, or `None` when it has no
/// context. The row is always unverified.
pub fn resolve_control_framework(
    item: &GeneratedControl,
    snapshot: &CompanySnapshot,
) -> Option<NewControlFramework> {
    if item.context.trim().is_empty() {
        tracing::warn!(company = %snapshot.id(), "dropping generated control without a context");
        return None;
    }
    let country_applied = match item.country_applied.as_deref().map(str::trim) {
        Some(country) if !country.is_empty() => country.to_string(),
        _ => snapshot.company.country.clone(),
    };

    Some(NewControlFramework {
        context: item.context.clone(),
        description: item.description.clone(),
        risk_management: item.risk_management.clone().unwrap_or_default(),
        country_applied,
        referral_source: item.referral_source.clone().unwrap_or_default(),
        id_domain: resolve_tag(snapshot, TagKind::Domain, &item.business_domain),
        id_activity: resolve_tag(snapshot, TagKind::Activity, &item.activities),
        id_market: resolve_tag(snapshot, TagKind::Market, &item.markets),
        id_laws_and_regulations: resolve_law(snapshot, &item.regulations),
        id_company: snapshot.id(),
        verified: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use regdesk_core::{
        Company, CompanyId, CompanyStatus, LawRegulation, NameRef, Tag,
    };

    fn tags(company: CompanyId, names: &[&str]) -> Vec<Tag> {
        names
            .iter()
            .map(|name| Tag {
                id: TagId::new(),
                name: name.to_string(),
                id_company: company,
            })
            .collect()
    }

    fn snapshot(domains: &[&str], activities: &[&str], markets: &[&str]) -> CompanySnapshot {
        let company = CompanyId::new();
        CompanySnapshot {
            company: Company {
                id: company,
                name: "Acme".into(),
                website: Some("https://acme.example".into()),
                duns_number: None,
                country: "US".into(),
                status: CompanyStatus::Active,
                created_at: "2026-01-15T12:00:00Z".parse().unwrap(),
                updated_at: None,
            },
            domains: tags(company, domains),
            activities: tags(company, activities),
            markets: tags(company, markets),
            laws: vec![],
            control_frameworks: vec![],
        }
    }

    fn law_in(snapshot: &CompanySnapshot, name: &str, domain: &str, activity: &str) -> LawRegulation {
        LawRegulation {
            id: LawId::new(),
            name: name.into(),
            description: format!("{name} text"),
            source: "gazette".into(),
            country: "US".into(),
            id_company: snapshot.id(),
            id_domain: None,
            id_activity: None,
            id_market: None,
            created_at: "2026-01-15T12:00:00Z".parse().unwrap(),
            updated_at: None,
            domains: Some(NameRef { name: domain.into() }),
            activities: Some(NameRef {
                name: activity.into(),
            }),
            markets: None,
        }
    }

    fn generated(name: &str) -> GeneratedLaw {
        GeneratedLaw {
            name: name.into(),
            description: "d".into(),
            source: "s".into(),
            ..Default::default()
        }
    }

    #[test]
    fn laws_request_lists_unique_names() {
        let snap = snapshot(&["Finance", "Retail", "Finance"], &["Lending"], &["US"]);
        let req = laws_request(&snap);
        assert_eq!(req.website_url, "https://acme.example");
        assert_eq!(req.company_name, "Acme");
        assert_eq!(req.business_domains, vec!["Finance", "Retail"]);
        assert_eq!(req.activities, vec!["Lending"]);
        assert_eq!(req.markets, vec!["US"]);
    }

    #[test]
    fn control_request_merges_law_linked_names() {
        let mut snap = snapshot(&["Finance"], &["Lending"], &["US"]);
        let gdpr = law_in(&snap, "GDPR", "Privacy", "Lending");
        let sox = law_in(&snap, "SOX", "Finance", "Audit");
        snap.laws = vec![gdpr, sox];

        let req = control_framework_request(&snap);
        assert_eq!(req.business_domains, vec!["Finance", "Privacy"]);
        assert_eq!(req.activities, vec!["Lending", "Audit"]);
        assert_eq!(req.laws_and_regulations.len(), 2);
        assert_eq!(
            req.laws_and_regulations[0].business_domain.as_deref(),
            Some("Privacy")
        );
        assert_eq!(req.laws_and_regulations[1].activity.as_deref(), Some("Audit"));
    }

    #[test]
    fn omitted_domain_expands_across_all_domains() {
        let snap = snapshot(&["Finance", "Retail"], &["Lending"], &["US"]);
        let mut item = generated("Truth in Lending Act");
        item.activities = ["Lending"].into_iter().collect();
        item.markets = ["US"].into_iter().collect();

        let rows = expand_law(&item, &snap);
        assert_eq!(rows.len(), 2);
        let domains: Vec<_> = rows.iter().map(|r| r.id_domain).collect();
        assert!(domains.contains(&Some(snap.domains[0].id)));
        assert!(domains.contains(&Some(snap.domains[1].id)));
        assert!(rows
            .iter()
            .all(|r| r.id_activity == Some(snap.activities[0].id)
                && r.id_market == Some(snap.markets[0].id)));
    }

    #[test]
    fn matched_names_do_not_expand() {
        let snap = snapshot(&["Finance", "Retail"], &["Lending", "Payments"], &["US"]);
        let mut item = generated("PCI DSS");
        item.business_domains = ["Retail"].into_iter().collect();
        item.activities = ["Payments", "Nonexistent"].into_iter().collect();

        let rows = expand_law(&item, &snap);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id_domain, Some(snap.domains[1].id));
        assert_eq!(rows[0].id_activity, Some(snap.activities[1].id));
    }

    #[test]
    fn unmatched_axes_multiply() {
        let snap = snapshot(&["A", "B"], &["X", "Y", "Z"], &["M1", "M2"]);
        let rows = expand_law(&generated("Omnibus"), &snap);
        assert_eq!(rows.len(), 12);
    }

    #[test]
    fn axis_without_tags_stays_null() {
        let snap = snapshot(&["Finance"], &[], &[]);
        let rows = expand_law(&generated("SOX"), &snap);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].id_activity.is_none());
        assert!(rows[0].id_market.is_none());
        assert_eq!(rows[0].country, "US");
    }

    #[test]
    fn law_country_prefers_item() {
        let snap = snapshot(&[], &[], &[]);
        let mut item = generated("GDPR");
        item.country = Some("EU".into());
        assert_eq!(expand_law(&item, &snap)[0].country, "EU");
        assert!(expand_law(&generated(" "), &snap).is_empty());
    }

    #[test]
    fn unmatched_regulation_is_null_and_unverified() {
        let mut snap = snapshot(&["Finance"], &["Lending"], &["US"]);
        let sox = law_in(&snap, "SOX", "Finance", "Lending");
        snap.laws = vec![sox];

        let item = GeneratedControl {
            context: "Access reviews".into(),
            business_domain: ["Finance"].into_iter().collect(),
            activities: ["Trading"].into_iter().collect(),
            regulations: ["Basel III"].into_iter().collect(),
            ..Default::default()
        };
        let row = resolve_control_framework(&item, &snap).unwrap();
        assert_eq!(row.id_domain, Some(snap.domains[0].id));
        assert!(row.id_activity.is_none());
        assert!(row.id_market.is_none());
        assert!(row.id_laws_and_regulations.is_none());
        assert!(!row.verified);
    }

    #[test]
    fn matched_regulation_links_law() {
        let mut snap = snapshot(&[], &[], &[]);
        let sox = law_in(&snap, "SOX", "Finance", "Audit");
        let sox_id = sox.id;
        snap.laws = vec![sox];
        let item = GeneratedControl {
            context: "Quarterly certification".into(),
            regulations: ["SOX"].into_iter().collect(),
            ..Default::default()
        };
        let row = resolve_control_framework(&item, &snap).unwrap();
        assert_eq!(row.id_laws_and_regulations, Some(sox_id));
        assert_eq!(row.country_applied, "US");
    }
}
