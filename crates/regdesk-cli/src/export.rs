//! # Export Subcommand
//!
//! Writes one control framework entry to an `.xlsx` file, named
//! `{id}.xlsx` in the current directory unless `--out` says otherwise.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use regdesk_core::ControlFrameworkId;
use regdesk_workflow::export_control_framework;
use serde_json::{json, Value};

use crate::Console;

/// Arguments for the `regdesk export` subcommand.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Control framework entry id.
    pub entry: ControlFrameworkId,

    /// Output path.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// Execute the export subcommand.
pub async fn run_export(args: &ExportArgs, console: &Console) -> Result<Value> {
    let entry = console.store.get_control_framework(args.entry).await?;
    let export = export_control_framework(&entry)?;
    let path = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&export.file_name));
    std::fs::write(&path, &export.bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = export.bytes.len(), "export written");
    Ok(json!({ "path": path.display().to_string(), "bytes": export.bytes.len() }))
}
