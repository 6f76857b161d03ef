//! Input selection and URL extraction
//!
//! - `select_latest`: picks the newest input table in a directory
//! - `extract_urls` / `load_batch`: turn one table into an ordered [`InputBatch`]

mod extractor;
mod selector;

pub use extractor::{extract_urls, load_batch, InputBatch};
pub use selector::select_latest;
