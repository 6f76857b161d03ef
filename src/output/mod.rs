//! Run output reporting
//!
//! This module holds the per-run summary the orchestrator returns and the
//! helper that prints it for the operator.

mod summary;

pub use summary::{print_summary, FailureKind, ItemFailure, MergedItem, RunSummary};
