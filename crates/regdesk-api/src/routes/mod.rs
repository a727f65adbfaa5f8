//! # API Route Modules
//!
//! Each submodule defines an Axum router for one area of the console.
//! Every route lives under `/v1`.

pub mod companies;
pub mod control_frameworks;
pub mod events;
pub mod generation;
pub mod laws;
pub mod tags;

use regdesk_core::{Criteria, Facet, ListState};
use serde::Deserialize;

/// Query parameters shared by the paged list endpoints.
///
/// Facet values are display names; `""` or `all` means no constraint.
/// `page` is 1-based and clamped to the available range.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub search: String,
    pub domain: String,
    pub activity: String,
    pub market: String,
    pub country: String,
    pub law: String,
    pub status: String,
    pub verification: String,
    pub page: usize,
}

impl ListQuery {
    fn raw(&self, facet: Facet) -> &str {
        match facet {
            Facet::Domain => &self.domain,
            Facet::Activity => &self.activity,
            Facet::Market => &self.market,
            Facet::Country => &self.country,
            Facet::Law => &self.law,
            Facet::Status => &self.status,
            Facet::Verification => &self.verification,
        }
    }

    /// List state restricted to the facets a resource supports. Parameters
    /// for other facets are ignored.
    pub fn list_state(&self, facets: &[Facet]) -> ListState {
        let criteria = facets.iter().fold(
            Criteria::new().with_search(self.search.clone()),
            |criteria, facet| criteria.with_filter(*facet, self.raw(*facet)),
        );
        ListState::from_parts(criteria, self.page)
    }
}
