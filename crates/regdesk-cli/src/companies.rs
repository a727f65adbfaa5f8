//! # Companies Subcommand
//!
//! `regdesk companies list` pages through companies; `regdesk companies
//! show` prints the detail aggregate (tags, laws, control framework).

use anyhow::Result;
use clap::{Args, Subcommand};
use regdesk_core::{CompanyId, Criteria, Facet, ListState};
use regdesk_workflow::CompanySnapshot;
use serde_json::Value;

use crate::Console;

/// Arguments for the `regdesk companies` subcommand.
#[derive(Args, Debug)]
pub struct CompaniesArgs {
    #[command(subcommand)]
    pub command: CompaniesCommand,
}

#[derive(Subcommand, Debug)]
pub enum CompaniesCommand {
    /// Filtered, paged company list.
    List {
        /// Case-insensitive search over name, country, and website.
        #[arg(long, short, default_value = "")]
        search: String,
        /// Country.
        #[arg(long)]
        country: Option<String>,
        /// Status (active, inactive, pending).
        #[arg(long)]
        status: Option<String>,
        /// 1-based page.
        #[arg(long, short, default_value_t = 1)]
        page: usize,
    },
    /// One company with its tags, laws, and control framework.
    Show {
        /// Company id.
        id: CompanyId,
    },
}

/// Execute the companies subcommand.
pub async fn run_companies(args: &CompaniesArgs, console: &Console) -> Result<Value> {
    match &args.command {
        CompaniesCommand::List {
            search,
            country,
            status,
            page,
        } => {
            let criteria = Criteria::new()
                .with_search(search.clone())
                .with_filter(Facet::Country, country.as_deref().unwrap_or_default())
                .with_filter(Facet::Status, status.as_deref().unwrap_or_default());
            let companies = console.store.list_companies().await?;
            let page = ListState::from_parts(criteria, *page).apply(&companies);
            Ok(serde_json::to_value(page)?)
        }
        CompaniesCommand::Show { id } => {
            let snapshot = CompanySnapshot::load(&*console.store, *id).await?;
            tracing::debug!(
                company = %id,
                laws = snapshot.laws.len(),
                control_framework = snapshot.control_frameworks.len(),
                "company loaded"
            );
            Ok(serde_json::to_value(snapshot)?)
        }
    }
}
