//! # Laws and Controls Subcommands
//!
//! `regdesk laws` and `regdesk controls` list one company's records through
//! the same search, facet, and paging rules the console tables use.

use anyhow::Result;
use clap::Args;
use regdesk_core::{CompanyId, Facet};
use serde_json::Value;

use crate::{Console, FilterArgs};

/// Arguments for the `regdesk laws` subcommand.
#[derive(Args, Debug)]
pub struct LawsArgs {
    /// Company id.
    pub company: CompanyId,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Arguments for the `regdesk controls` subcommand.
#[derive(Args, Debug)]
pub struct ControlsArgs {
    /// Company id.
    pub company: CompanyId,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Linked law name.
    #[arg(long)]
    pub law: Option<String>,

    /// `verified`, `unverified`, or `all`.
    #[arg(long)]
    pub verification: Option<String>,
}

/// Execute the laws subcommand.
pub async fn run_laws(args: &LawsArgs, console: &Console) -> Result<Value> {
    console.store.get_company(args.company).await?;
    let laws = console.store.list_laws(Some(args.company)).await?;
    let page = args.filter.list_state(&[]).apply(&laws);
    Ok(serde_json::to_value(page)?)
}

/// Execute the controls subcommand.
pub async fn run_controls(args: &ControlsArgs, console: &Console) -> Result<Value> {
    console.store.get_company(args.company).await?;
    let entries = console
        .store
        .list_control_frameworks(Some(args.company))
        .await?;
    let state = args.filter.list_state(&[
        (Facet::Law, args.law.as_deref()),
        (Facet::Verification, args.verification.as_deref()),
    ]);
    Ok(serde_json::to_value(state.apply(&entries))?)
}
