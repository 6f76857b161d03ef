//! Accumulator trait
//!
//! The orchestrator owns exactly one accumulator per run and feeds it staged
//! documents in batch order. Rendering to bytes is kept separate from writing
//! so the orchestrator decides where the output lands.

use crate::MergeError;
use std::path::Path;

/// In-progress merged-output builder
pub trait Accumulator {
    /// Appends every page of the staged document at `path`
    ///
    /// Returns the number of pages appended. On error the accumulator is left
    /// exactly as it was before the call.
    fn append(&mut self, path: &Path) -> Result<usize, MergeError>;

    /// Number of page-sets appended so far
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of pages appended so far
    fn page_count(&self) -> usize;

    /// Serializes the merged document
    fn render(&mut self) -> Result<Vec<u8>, MergeError>;
}
