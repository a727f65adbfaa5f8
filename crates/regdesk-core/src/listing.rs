//! # List Filtering and Pagination
//!
//! The console lists laws, control framework entries, and companies through
//! one engine:
//!
//! 1. **Search**: case-insensitive substring match against the record's
//!    searchable text fields. An empty search admits everything.
//! 2. **Facets**: zero or more categorical filters. A facet set to `""` or
//!    `"all"` admits everything; any other value must equal the record's
//!    display name for that facet exactly (names, not identifiers).
//! 3. **Pages**: fixed [`PAGE_SIZE`], 1-based, clamped to the available
//!    range.
//!
//! All active constraints combine with logical AND. Order is whatever the
//! store returned; the engine never sorts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{Company, ControlFramework, LawRegulation};

/// Records per page.
pub const PAGE_SIZE: usize = 10;

/// Categorical axes a list can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// Joined domain name.
    Domain,
    /// Joined activity name.
    Activity,
    /// Joined market name.
    Market,
    /// Country (law country, control framework country applied, company country).
    Country,
    /// Joined law name.
    Law,
    /// Company status.
    Status,
    /// `verified` / `unverified`.
    Verification,
}

/// A record that can be searched and faceted.
pub trait Listable {
    /// Text fields the search term is matched against.
    fn search_fields(&self) -> Vec<&str>;

    /// Display value for `facet`, or `None` when the record has none.
    fn facet(&self, facet: Facet) -> Option<&str>;
}

/// One categorical constraint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FacetFilter {
    /// No constraint.
    #[default]
    Any,
    /// The facet value must equal this string exactly.
    Exact(String),
}

impl FacetFilter {
    /// Parse a raw filter value; `""` and `"all"` (any case) mean no constraint.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            Self::Any
        } else {
            Self::Exact(raw.to_string())
        }
    }

    /// Whether a record whose facet value is `value` passes.
    pub fn admits(&self, value: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => value == Some(expected.as_str()),
        }
    }
}

/// Search term plus facet constraints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Criteria {
    /// Search term; empty admits every record.
    pub search: String,
    /// Active facet constraints.
    pub filters: BTreeMap<Facet, FacetFilter>,
}

impl Criteria {
    /// Criteria that admit every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search term.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Constrain `facet` with a raw filter value.
    pub fn with_filter(mut self, facet: Facet, raw: &str) -> Self {
        self.set_filter(facet, raw);
        self
    }

    /// Constrain `facet` with a raw filter value. [`FacetFilter::Any`]
    /// removes the constraint.
    pub fn set_filter(&mut self, facet: Facet, raw: &str) {
        match FacetFilter::parse(raw) {
            FacetFilter::Any => {
                self.filters.remove(&facet);
            }
            exact => {
                self.filters.insert(facet, exact);
            }
        }
    }

    /// Whether `record` passes the search and every facet.
    pub fn matches<T: Listable>(&self, record: &T) -> bool {
        self.matches_search(record)
            && self
                .filters
                .iter()
                .all(|(facet, filter)| filter.admits(record.facet(*facet)))
    }

    fn matches_search<T: Listable>(&self, record: &T) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let term = self.search.to_lowercase();
        record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }

    /// Records that pass, in input order.
    pub fn filter<'a, T: Listable>(&self, records: &'a [T]) -> Vec<&'a T> {
        records.iter().filter(|r| self.matches(*r)).collect()
    }
}

/// One page of a filtered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// 1-based page index actually served (after clamping).
    pub page: usize,
    /// `ceil(total_items / PAGE_SIZE)`.
    pub total_pages: usize,
    /// Number of records that passed the filter.
    pub total_items: usize,
}

impl<T> Page<T> {
    /// Transform the records on the page, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}

/// Number of pages needed for `total` records.
pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE)
}

/// Clamp a requested 1-based page index to `[1, max(total_pages, 1)]`.
pub fn clamp_page(requested: usize, total_pages: usize) -> usize {
    requested.clamp(1, total_pages.max(1))
}

/// Slice an already-filtered list into the requested page.
pub fn paginate<T>(filtered: Vec<T>, requested: usize) -> Page<T> {
    let total_items = filtered.len();
    let total_pages = page_count(total_items);
    let page = clamp_page(requested, total_pages);
    let items = filtered
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();
    Page {
        items,
        page,
        total_pages,
        total_items,
    }
}

/// Criteria plus current page, with the reset rule the console relies on:
/// changing any criterion sends the user back to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListState {
    criteria: Criteria,
    page: usize,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            criteria: Criteria::default(),
            page: 1,
        }
    }
}

impl ListState {
    /// Start on page 1 with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from explicit criteria and page, as received from a request.
    pub fn from_parts(criteria: Criteria, page: usize) -> Self {
        Self { criteria, page }
    }

    /// Current criteria.
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Requested page (not yet clamped).
    pub fn page(&self) -> usize {
        self.page
    }

    /// Change the search term. Resets to page 1.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.criteria.search = search.into();
        self.page = 1;
    }

    /// Change one facet. Resets to page 1.
    pub fn set_filter(&mut self, facet: Facet, raw: &str) {
        self.criteria.set_filter(facet, raw);
        self.page = 1;
    }

    /// Drop every constraint. Resets to page 1.
    pub fn clear(&mut self) {
        self.criteria = Criteria::default();
        self.page = 1;
    }

    /// Move to another page.
    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Filter `records` and cut the current page.
    pub fn apply<T: Listable + Clone>(&self, records: &[T]) -> Page<T> {
        let filtered = self
            .criteria
            .filter(records)
            .into_iter()
            .cloned()
            .collect();
        paginate(filtered, self.page)
    }
}

// -- Listable records ---------------------------------------------------------

impl Listable for LawRegulation {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.source.as_str(),
        ]
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Domain => self.domain_name(),
            Facet::Activity => self.activity_name(),
            Facet::Market => self.market_name(),
            Facet::Country => Some(self.country.as_str()),
            Facet::Law => Some(self.name.as_str()),
            Facet::Status | Facet::Verification => None,
        }
    }
}

impl Listable for ControlFramework {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.context.as_str(),
            self.description.as_str(),
            self.risk_management.as_str(),
            self.referral_source.as_str(),
        ]
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Domain => self.domain_name(),
            Facet::Activity => self.activity_name(),
            Facet::Market => self.market_name(),
            Facet::Country => Some(self.country_applied.as_str()),
            Facet::Law => self.law_name(),
            Facet::Verification => Some(if self.verified { "verified" } else { "unverified" }),
            Facet::Status => None,
        }
    }
}

impl Listable for Company {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.country.as_str()];
        if let Some(website) = &self.website {
            fields.push(website.as_str());
        }
        fields
    }

    fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Country => Some(self.country.as_str()),
            Facet::Status => Some(self.status.as_str()),
            _ => None,
        }
    }
}
