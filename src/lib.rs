//! PDF-Harvest: a CSV-driven PDF downloader and merger
//!
//! This crate picks the newest CSV table in a directory, reads a column of
//! document URLs from it, downloads each document, keeps only genuine PDFs and
//! merges them into a single output file in row order.

pub mod config;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod source;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for PDF-Harvest operations
///
/// Only batch-level faults end up here. Per-item faults ([`FetchError`],
/// [`MergeError`]) are logged by the orchestrator and never abort a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create staging area: {0}")]
    Staging(std::io::Error),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to write merged output: {0}")]
    Finalize(MergeError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while reading URLs out of an input table
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Cannot open {path}: {source}")]
    SourceNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No '{column}' column in {path}")]
    ColumnMissing { column: String, path: PathBuf },

    #[error("Malformed table {path}: {source}")]
    Malformed { path: PathBuf, source: csv::Error },
}

/// Failure to fetch one URL as a PDF
#[derive(Debug, Error)]
#[error("error on {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchFailure,
}

/// Why a single fetch failed
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] ::url::ParseError),

    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("not the expected format (content-type: {content_type})")]
    NotExpectedFormat { content_type: String },

    #[error("failed to stage file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a merge accumulator
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Cannot load {path} as PDF: {source}")]
    Load { path: PathBuf, source: lopdf::Error },

    #[error("{path} has no pages")]
    NoPages { path: PathBuf },

    #[error("Cannot encode merged document: {0}")]
    Encode(String),

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for PDF-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use merge::{Accumulator, PdfAccumulator};
pub use pipeline::{harvest, DocumentFetcher, MergeOrchestrator};
pub use progress::{ProgressSink, SilentProgress, TerminalProgress};
pub use source::{load_batch, select_latest, InputBatch};
pub use state::RunState;
