//! Merge accumulators
//!
//! - `Accumulator`: append-only builder the orchestrator feeds staged files into
//! - `PdfAccumulator`: the `lopdf` implementation used for real runs

mod pdf;
mod traits;

pub use pdf::PdfAccumulator;
pub use traits::Accumulator;

#[cfg(test)]
pub(crate) use pdf::tests::{page_widths, sample_pdf};
