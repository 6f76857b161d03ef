//! URL extraction from input tables
//!
//! Rows keep their file order and duplicates are kept: the merge order must
//! mirror the table exactly.

use crate::ExtractError;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Ordered, immutable list of URLs read from one input table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBatch {
    source: Option<PathBuf>,
    urls: Vec<String>,
}

impl InputBatch {
    /// Creates a batch from already-extracted URLs
    pub fn new(source: Option<PathBuf>, urls: Vec<String>) -> Self {
        Self { source, urls }
    }

    /// Creates an empty batch, optionally remembering where it came from
    pub fn empty(source: Option<PathBuf>) -> Self {
        Self {
            source,
            urls: Vec::new(),
        }
    }

    /// The table this batch was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.urls.iter()
    }
}

impl<'a> IntoIterator for &'a InputBatch {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.iter()
    }
}

/// Reads the URL column of a table
///
/// Rows shorter than the header yield an empty URL so the row count is
/// preserved; the fetch step rejects it later.
///
/// # Errors
///
/// * `ExtractError::SourceNotFound` - `path` cannot be opened
/// * `ExtractError::ColumnMissing` - the header has no `column`
/// * `ExtractError::Malformed` - the table cannot be decoded
pub fn extract_urls(path: &Path, column: &str) -> Result<InputBatch, ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let malformed = |source: csv::Error| ExtractError::Malformed {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let index = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| ExtractError::ColumnMissing {
            column: column.to_string(),
            path: path.to_path_buf(),
        })?;

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        urls.push(record.get(index).unwrap_or_default().to_string());
    }

    Ok(InputBatch::new(Some(path.to_path_buf()), urls))
}

/// Reads the URL column of a table, degrading to an empty batch on error
///
/// Extraction faults are logged and never abort the run: the caller gets a
/// batch with zero items instead.
pub fn load_batch(path: &Path, column: &str) -> InputBatch {
    match extract_urls(path, column) {
        Ok(batch) => {
            tracing::info!("Read {} URLs from {}", batch.len(), path.display());
            batch
        }
        Err(e) => {
            tracing::error!("{}", e);
            InputBatch::empty(Some(path.to_path_buf()))
        }
    }
}
