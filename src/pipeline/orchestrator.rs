//! Merge orchestrator - main download/merge loop
//!
//! This module drives one run over an [`InputBatch`]:
//! - Creating the run-scoped staging directory
//! - Fetching every URL in batch order, one at a time
//! - Appending each staged PDF to the accumulator
//! - Reporting progress after every item, success or not
//! - Writing the merged output when at least one item made it in
//!
//! A failing item is logged and recorded, then the loop moves on.

use crate::merge::{Accumulator, PdfAccumulator};
use crate::output::{FailureKind, ItemFailure, MergedItem, RunSummary};
use crate::pipeline::DocumentFetcher;
use crate::progress::{fraction_done, ProgressSink};
use crate::source::InputBatch;
use crate::state::RunState;
use crate::{HarvestError, MergeError};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Prefix of the per-run staging directory
const STAGING_PREFIX: &str = "pdf-harvest-";

/// Outcome of one item
#[derive(Debug)]
enum ItemOutcome {
    Merged(MergedItem),
    Skipped(ItemFailure),
}

/// Running `(successes, failures)` pair folded over the batch
#[derive(Debug, Default)]
struct Tally {
    merged: Vec<MergedItem>,
    failures: Vec<ItemFailure>,
}

impl Tally {
    fn record(mut self, outcome: ItemOutcome) -> Self {
        match outcome {
            ItemOutcome::Merged(item) => self.merged.push(item),
            ItemOutcome::Skipped(failure) => self.failures.push(failure),
        }
        self
    }
}

/// Main merge orchestrator structure
///
/// Owns the accumulator exclusively for the duration of one run; `run`
/// consumes the orchestrator so the accumulator is released when it returns.
pub struct MergeOrchestrator<A: Accumulator = PdfAccumulator> {
    fetcher: DocumentFetcher,
    accumulator: A,
    output: PathBuf,
    staging_root: Option<PathBuf>,
    state: RunState,
}

impl<A: Accumulator> MergeOrchestrator<A> {
    /// Creates a new orchestrator writing to `output`
    pub fn new(fetcher: DocumentFetcher, accumulator: A, output: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            accumulator,
            output: output.into(),
            staging_root: None,
            state: RunState::Idle,
        }
    }

    /// Creates the staging directory under `root` instead of the system temp dir
    pub fn with_staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = Some(root.into());
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, to: RunState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(to) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!("Run state {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Runs the batch to completion
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The run completed, in state `Done` or `Empty`
    /// * `Err(HarvestError)` - A batch-level fault (staging area or output write)
    pub async fn run(
        mut self,
        batch: &InputBatch,
        progress: &mut dyn ProgressSink,
    ) -> Result<RunSummary, HarvestError> {
        let started_at = Utc::now();
        let started = Instant::now();
        self.transition(RunState::Running)?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let staging = match &self.staging_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(HarvestError::Staging)?;
        tracing::debug!("Staging downloads in {}", staging.path().display());

        let total = batch.len();
        progress.start(total);

        let mut tally = Tally::default();
        for (index, url) in batch.iter().enumerate() {
            let outcome = self.process_item(index, url, staging.path()).await;
            tally = tally.record(outcome);
            progress.update(fraction_done(index, total));
        }
        progress.finish();

        let written = self.finalize().await;

        if let Err(e) = staging.close() {
            tracing::warn!("Failed to remove staging directory: {}", e);
        }
        tracing::info!("-- END MERGING --");

        let (output, output_sha256) = match written? {
            Some((path, digest)) => (Some(path), Some(digest)),
            None => (None, None),
        };

        Ok(RunSummary {
            state: self.state,
            total,
            merged: tally.merged,
            failures: tally.failures,
            output,
            output_sha256,
            started_at,
            elapsed: started.elapsed(),
        })
    }

    /// Fetches one URL and appends it
    async fn process_item(&mut self, index: usize, url: &str, staging: &Path) -> ItemOutcome {
        let staged = match self.fetcher.fetch(index, url, staging).await {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("{}", e);
                return ItemOutcome::Skipped(ItemFailure {
                    index,
                    url: url.to_string(),
                    kind: FailureKind::Fetch,
                    message: e.cause.to_string(),
                });
            }
        };

        match self.accumulator.append(&staged) {
            Ok(pages) => {
                tracing::info!("{} added to {}", staged.display(), self.output.display());
                ItemOutcome::Merged(MergedItem {
                    index,
                    url: url.to_string(),
                    pages,
                })
            }
            Err(e) => {
                tracing::error!("error while adding {}: {}", staged.display(), e);
                ItemOutcome::Skipped(ItemFailure {
                    index,
                    url: url.to_string(),
                    kind: FailureKind::Append,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Writes the output if anything was appended
    ///
    /// Returns the output path and its hex SHA-256, or `None` for an empty run.
    async fn finalize(&mut self) -> Result<Option<(PathBuf, String)>, HarvestError> {
        if self.accumulator.is_empty() {
            self.transition(RunState::Empty)?;
            tracing::warn!("no PDF has been added, {} not written", self.output.display());
            return Ok(None);
        }

        self.transition(RunState::Finalizing)?;
        let bytes = self.accumulator.render().map_err(HarvestError::Finalize)?;

        let write_error = |source: std::io::Error| {
            HarvestError::Finalize(MergeError::Write {
                path: self.output.clone(),
                source,
            })
        };
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(&self.output, &bytes)
            .await
            .map_err(write_error)?;

        let digest = hex::encode(Sha256::digest(&bytes));
        tracing::info!(
            "{} created ({} page-sets, {} pages, sha256 {})",
            self.output.display(),
            self.accumulator.len(),
            self.accumulator.page_count(),
            digest
        );

        let output = self.output.clone();
        self.transition(RunState::Done)?;
        Ok(Some((output, digest)))
    }
}
