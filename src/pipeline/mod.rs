//! Download-validate-merge pipeline
//!
//! This module contains the core harvesting logic, including:
//! - Response classification and staged-file naming
//! - HTTP fetching of single documents
//! - The orchestrator that folds a batch into one merged PDF

mod content;
mod fetcher;
mod orchestrator;

pub use content::{attachment_filename, is_pdf_response, staged_filename};
pub use fetcher::{build_http_client, DocumentFetcher};
pub use orchestrator::MergeOrchestrator;

use crate::config::Config;
use crate::merge::PdfAccumulator;
use crate::output::RunSummary;
use crate::progress::ProgressSink;
use crate::source::{load_batch, select_latest, InputBatch};
use crate::HarvestError;
use std::path::Path;

/// Builds the batch for a run
///
/// Uses `input` when given, otherwise the newest table in the configured
/// source directory. A missing table is not an error: the batch is empty.
pub fn prepare_batch(config: &Config, input: Option<&Path>) -> InputBatch {
    let source = match input {
        Some(path) => Some(path.to_path_buf()),
        None => select_latest(&config.source.directory, &config.source.extension),
    };

    match source {
        Some(path) => {
            tracing::info!("Using input table {}", path.display());
            load_batch(&path, &config.source.column)
        }
        None => {
            tracing::warn!(
                "No {} files found in the '{}' directory.",
                config.source.extension,
                config.source.directory.display()
            );
            InputBatch::empty(None)
        }
    }
}

/// Runs a complete harvest over `batch`
///
/// This is the main entry point for a run. It will:
/// 1. Build the HTTP client
/// 2. Fetch and validate every URL in order
/// 3. Merge the accepted PDFs into the configured output
///
/// # Returns
///
/// * `Ok(RunSummary)` - Run completed (possibly with nothing merged)
/// * `Err(HarvestError)` - A batch-level fault stopped the run
pub async fn harvest(
    config: &Config,
    batch: &InputBatch,
    progress: &mut dyn ProgressSink,
) -> Result<RunSummary, HarvestError> {
    tracing::info!("{} is downloading", config);

    let fetcher = DocumentFetcher::new(&config.http)?;
    MergeOrchestrator::new(fetcher, PdfAccumulator::new(), config.output.path.clone())
        .run(batch, progress)
        .await
}
