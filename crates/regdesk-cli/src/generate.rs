//! # Generate and Submit Subcommands
//!
//! `regdesk generate laws` replaces a company's laws with generated ones;
//! `regdesk generate controls` adds generated control framework entries.
//! Ctrl-C during a run cancels it; if the write had already started it
//! completes first. `regdesk submit` marks every entry verified.

use anyhow::Result;
use clap::{Args, Subcommand};
use regdesk_core::CompanyId;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::Console;

/// Arguments for the `regdesk generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(subcommand)]
    pub target: GenerateTarget,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum GenerateTarget {
    /// Regenerate the company's laws.
    Laws {
        /// Company id.
        company: CompanyId,
    },
    /// Generate control framework entries from the company's laws.
    Controls {
        /// Company id.
        company: CompanyId,
    },
}

/// Arguments for the `regdesk submit` subcommand.
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Company id.
    pub company: CompanyId,
}

/// Execute the generate subcommand, cancelling on Ctrl-C.
pub async fn run_generate(args: &GenerateArgs, console: &Console) -> Result<Value> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling generation");
            on_interrupt.cancel();
        }
    });

    let result = generate_with(args.target, console, &cancel).await;
    interrupt.abort();
    result
}

/// Run one generation under an explicit cancellation token.
pub async fn generate_with(
    target: GenerateTarget,
    console: &Console,
    cancel: &CancellationToken,
) -> Result<Value> {
    let pipeline = console.pipeline()?;
    let report = match target {
        GenerateTarget::Laws { company } => pipeline.generate_laws(company, cancel).await?,
        GenerateTarget::Controls { company } => {
            pipeline.generate_control_framework(company, cancel).await?
        }
    };
    Ok(serde_json::to_value(report)?)
}

/// Execute the submit subcommand.
pub async fn run_submit(args: &SubmitArgs, console: &Console) -> Result<Value> {
    let verified = regdesk_workflow::submit(&*console.store, args.company).await?;
    Ok(json!({ "company": args.company, "verified": verified }))
}
