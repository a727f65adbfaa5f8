//! # Generation Pipeline
//!
//! | Step | Laws | Control framework |
//! |------|------|-------------------|
//! | 1 | load [`CompanySnapshot`] | load [`CompanySnapshot`] |
//! | 2 | [`laws_request`] | [`control_framework_request`] |
//! | 3 | POST laws webhook | POST control-framework webhook |
//! | 4 | [`expand_law`] per item | [`resolve_control_framework`] per item |
//! | 5 | replace the company's laws | insert additively |
//!
//! A [`CancellationToken`] is checked up to step 5. Once the write starts
//! it runs to completion, so a cancelled run either wrote nothing or wrote
//! everything. A webhook failure aborts before any write.

use std::future::Future;
use std::sync::Arc;

use regdesk_client::{Generator, RecordStore};
use regdesk_core::{CompanyId, NewControlFramework, NewLaw};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::WorkflowError;
use crate::generation::{
    control_framework_request, expand_law, laws_request, resolve_control_framework,
};
use crate::snapshot::CompanySnapshot;

/// What a generation run changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Company the run was for.
    pub company: CompanyId,
    /// Items the webhook proposed.
    pub requested: usize,
    /// Rows written.
    pub inserted: usize,
    /// Previous rows removed (laws only).
    pub replaced: usize,
}

/// Runs generation and submit against one store and one generator.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn RecordStore>,
    generator: Arc<dyn Generator>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

/// Await `fut` unless `cancel` fires first.
async fn until_cancelled<T, E, F>(cancel: &CancellationToken, fut: F) -> Result<T, WorkflowError>
where
    F: Future<Output = Result<T, E>>,
    WorkflowError: From<E>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WorkflowError::Cancelled),
        result = fut => result.map_err(WorkflowError::from),
    }
}

impl Pipeline {
    /// Create a pipeline.
    pub fn new(store: Arc<dyn RecordStore>, generator: Arc<dyn Generator>) -> Self {
        Self { store, generator }
    }

    /// Regenerate the company's laws, replacing the current set.
    pub async fn generate_laws(
        &self,
        company: CompanyId,
        cancel: &CancellationToken,
    ) -> Result<GenerationReport, WorkflowError> {
        let snapshot = until_cancelled(cancel, CompanySnapshot::load(&*self.store, company)).await?;
        let request = laws_request(&snapshot);
        tracing::info!(
            company = %company,
            domains = request.business_domains.len(),
            activities = request.activities.len(),
            markets = request.markets.len(),
            "requesting laws"
        );

        let response = until_cancelled(cancel, self.generator.generate_laws(&request)).await?;
        let rows: Vec<NewLaw> = response
            .laws_and_regulations
            .iter()
            .flat_map(|item| expand_law(item, &snapshot))
            .collect();

        if cancel.is_cancelled() {
            tracing::info!(company = %company, "law generation cancelled before write");
            return Err(WorkflowError::Cancelled);
        }
        let outcome = self.store.replace_laws(company, &rows).await?;

        let report = GenerationReport {
            company,
            requested: response.laws_and_regulations.len(),
            inserted: outcome.inserted.len(),
            replaced: outcome.removed,
        };
        tracing::info!(
            company = %company,
            requested = report.requested,
            inserted = report.inserted,
            replaced = report.replaced,
            "laws generated"
        );
        Ok(report)
    }

    /// Generate control framework entries and add them to the company's
    /// existing ones.
    pub async fn generate_control_framework(
        &self,
        company: CompanyId,
        cancel: &CancellationToken,
    ) -> Result<GenerationReport, WorkflowError> {
        let snapshot = until_cancelled(cancel, CompanySnapshot::load(&*self.store, company)).await?;
        let request = control_framework_request(&snapshot);
        tracing::info!(
            company = %company,
            laws = request.laws_and_regulations.len(),
            "requesting control framework"
        );

        let response =
            until_cancelled(cancel, self.generator.generate_control_framework(&request)).await?;
        let rows: Vec<NewControlFramework> = response
            .control_framework
            .iter()
            .filter_map(|item| resolve_control_framework(item, &snapshot))
            .collect();

        if cancel.is_cancelled() {
            tracing::info!(company = %company, "control framework generation cancelled before write");
            return Err(WorkflowError::Cancelled);
        }
        let inserted = self.store.insert_control_frameworks(&rows).await?;

        let report = GenerationReport {
            company,
            requested: response.control_framework.len(),
            inserted: inserted.len(),
            replaced: 0,
        };
        tracing::info!(
            company = %company,
            requested = report.requested,
            inserted = report.inserted,
            "control framework generated"
        );
        Ok(report)
    }

    /// Mark every control framework entry of the company as verified.
    pub async fn submit(&self, company: CompanyId) -> Result<usize, WorkflowError> {
        submit(&*self.store, company).await
    }
}

/// Mark every control framework entry of `company` as verified. Returns how
/// many entries changed. Does not need a generator.
pub async fn submit(store: &dyn RecordStore, company: CompanyId) -> Result<usize, WorkflowError> {
    store.get_company(company).await?;
    let verified = store.verify_control_frameworks(company).await?;
    tracing::info!(company = %company, verified, "control framework submitted");
    Ok(verified)
}
