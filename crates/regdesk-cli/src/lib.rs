//! # regdesk-cli -- Command-line console
//!
//! Provides the `regdesk` command, a terminal front end to the same
//! workflows the HTTP service exposes. Every subcommand prints JSON.
//!
//! ## Subcommands
//!
//! - `regdesk companies list|show`: company list and detail.
//! - `regdesk laws <COMPANY>`: filtered, paged laws.
//! - `regdesk controls <COMPANY>`: filtered, paged control framework.
//! - `regdesk generate laws|controls <COMPANY>`: run a generation
//!   (Ctrl-C cancels it before anything is written).
//! - `regdesk submit <COMPANY>`: verify every control framework entry.
//! - `regdesk export <ENTRY>`: write one entry as an `.xlsx` file.
//!
//! ```bash
//! regdesk laws 5b0c... --domain Finance --page 2
//! regdesk generate controls 5b0c...
//! regdesk export 9e41... --out review.xlsx
//! ```

pub mod companies;
pub mod export;
pub mod generate;
pub mod records;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use regdesk_client::{
    ClientConfig, GenerationClient, Generator, RecordStore, RestStore,
};
use regdesk_core::{Criteria, Facet, ListState};
use regdesk_workflow::Pipeline;

/// The collaborators a subcommand works against.
#[derive(Clone)]
pub struct Console {
    /// Record store.
    pub store: Arc<dyn RecordStore>,
    /// Generation webhooks, when configured.
    pub generator: Option<Arc<dyn Generator>>,
}

impl Console {
    /// Use `store` and `generator` directly.
    pub fn new(store: Arc<dyn RecordStore>, generator: Option<Arc<dyn Generator>>) -> Self {
        Self { store, generator }
    }

    /// Connect using `REGDESK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env().context("backend is not configured")?;
        let store = RestStore::new(&config.backend).context("failed to create backend client")?;
        let generator = match &config.webhooks {
            Some(webhooks) => Some(Arc::new(
                GenerationClient::new(webhooks).context("failed to create webhook client")?,
            ) as Arc<dyn Generator>),
            None => None,
        };
        Ok(Self::new(Arc::new(store), generator))
    }

    /// A generation pipeline; fails when the webhooks are not configured.
    pub fn pipeline(&self) -> Result<Pipeline> {
        let generator = self.generator.clone().context(
            "generation webhooks are not configured \
             (set REGDESK_LAWS_WEBHOOK_URL and REGDESK_CONTROLS_WEBHOOK_URL)",
        )?;
        Ok(Pipeline::new(self.store.clone(), generator))
    }
}

/// Search, facet, and page flags shared by the list subcommands.
///
/// Facet values are display names; `all` clears a facet.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive search term.
    #[arg(long, short, default_value = "")]
    pub search: String,

    /// Domain name.
    #[arg(long)]
    pub domain: Option<String>,

    /// Activity name.
    #[arg(long)]
    pub activity: Option<String>,

    /// Market name.
    #[arg(long)]
    pub market: Option<String>,

    /// Country.
    #[arg(long)]
    pub country: Option<String>,

    /// 1-based page; out-of-range values are clamped.
    #[arg(long, short, default_value_t = 1)]
    pub page: usize,
}

impl FilterArgs {
    /// List state for these flags plus any extra facet constraints.
    pub fn list_state(&self, extra: &[(Facet, Option<&str>)]) -> ListState {
        let facets = [
            (Facet::Domain, self.domain.as_deref()),
            (Facet::Activity, self.activity.as_deref()),
            (Facet::Market, self.market.as_deref()),
            (Facet::Country, self.country.as_deref()),
        ];
        let criteria = facets
            .iter()
            .chain(extra)
            .fold(Criteria::new().with_search(self.search.clone()), |c, (facet, raw)| {
                c.with_filter(*facet, raw.unwrap_or_default())
            });
        ListState::from_parts(criteria, self.page)
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to encode output")?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regdesk_core::FacetFilter;

    #[test]
    fn filter_flags_build_criteria() {
        let args = FilterArgs {
            search: "bank".into(),
            market: Some("EU".into()),
            country: Some("all".into()),
            page: 2,
            ..FilterArgs::default()
        };
        let state = args.list_state(&[(Facet::Verification, Some("unverified"))]);
        let criteria = state.criteria();
        assert_eq!(criteria.search, "bank");
        assert_eq!(criteria.filters.len(), 2);
        assert_eq!(
            criteria.filters.get(&Facet::Market),
            Some(&FacetFilter::Exact("EU".into()))
        );
        assert!(!criteria.filters.contains_key(&Facet::Country));
        assert_eq!(state.page(), 2);
    }
}
