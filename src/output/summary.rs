//! Run summary types and display
//!
//! A run always ends in one of two operator-visible outcomes: an output file
//! with N of M items merged, or no output file and a warning explaining why.

use crate::state::RunState;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Which step rejected an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Download, status or content-type check failed
    Fetch,
    /// The staged file could not be appended to the merged document
    Append,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Append => write!(f, "append"),
        }
    }
}

/// An item whose pages made it into the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedItem {
    /// Position in the batch (0-based)
    pub index: usize,
    pub url: String,
    /// Number of pages appended
    pub pages: usize,
}

/// An item that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Position in the batch (0-based)
    pub index: usize,
    pub url: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one merge run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// `Done` when an output was written, `Empty` otherwise
    pub state: RunState,

    /// Number of URLs in the batch
    pub total: usize,

    /// Items merged, in output order
    pub merged: Vec<MergedItem>,

    /// Items skipped, in batch order
    pub failures: Vec<ItemFailure>,

    /// Path of the written output, if any
    pub output: Option<PathBuf>,

    /// Hex SHA-256 of the written output, if any
    pub output_sha256: Option<String>,

    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn merged_count(&self) -> usize {
        self.merged.len()
    }

    pub fn page_count(&self) -> usize {
        self.merged.iter().map(|item| item.pages).sum()
    }

    /// Returns true when no output was produced
    pub fn is_empty_result(&self) -> bool {
        self.state == RunState::Empty
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!();
    match &summary.output {
        Some(path) => println!(
            "Merged {} of {} PDFs ({} pages) into {}",
            summary.merged_count(),
            summary.total,
            summary.page_count(),
            path.display()
        ),
        None if summary.total == 0 => println!("No URLs to fetch, no output written"),
        None => println!(
            "None of the {} URLs produced a PDF, no output written",
            summary.total
        ),
    }

    if let Some(digest) = &summary.output_sha256 {
        println!("  SHA-256: {}", digest);
    }

    if !summary.failures.is_empty() {
        println!("Skipped ({}):", summary.failures.len());
        for failure in &summary.failures {
            println!(
                "  #{} [{}] {}: {}",
                failure.index + 1,
                failure.kind,
                failure.url,
                failure.message
            );
        }
    }

    println!(
        "Started {} UTC, elapsed: {:.2}s",
        summary.started_at.format("%Y-%m-%d %H:%M:%S"),
        summary.elapsed.as_secs_f64()
    );
}
