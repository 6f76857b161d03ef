//! PDF-Harvest main entry point
//!
//! This is the command-line interface for the PDF-Harvest downloader/merger.

use anyhow::Context;
use clap::Parser;
use pdf_harvest::config::{load_config, validate, Config};
use pdf_harvest::output::print_summary;
use pdf_harvest::pipeline::{harvest, prepare_batch};
use pdf_harvest::progress::{ProgressSink, SilentProgress, TerminalProgress};
use pdf_harvest::source::InputBatch;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Label shown in front of the progress bar
const PROGRESS_LABEL: &str = "merging";

/// PDF-Harvest: download the PDFs listed in a CSV and merge them
///
/// Picks the newest CSV in the source directory (or the INPUT given), reads
/// one URL per row from the configured column, downloads every PDF and
/// merges them into a single file in row order.
#[derive(Parser, Debug)]
#[command(name = "pdf-harvest")]
#[command(version)]
#[command(about = "Download the PDFs listed in a CSV and merge them", long_about = None)]
struct Cli {
    /// CSV file to read instead of the newest one in the source directory
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Name of the PDF file to export
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory scanned for input tables
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Column holding the URLs
    #[arg(long, value_name = "NAME")]
    column: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// List the URLs that would be fetched without downloading anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, &config.output.log_file)?;

    let batch = prepare_batch(&config, cli.input.as_deref());
    let banner = format!(
        "{} ({} pdf) --> {}",
        batch
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<no input>".to_string()),
        batch.len(),
        config.output.path.display()
    );
    tracing::info!("{}", banner);
    if !cli.quiet {
        println!("{}", banner);
    }

    if cli.dry_run {
        handle_dry_run(&batch);
        return Ok(());
    }

    let mut progress: Box<dyn ProgressSink> = if cli.quiet {
        Box::new(SilentProgress)
    } else {
        Box::new(TerminalProgress::new(PROGRESS_LABEL))
    };

    let summary = match harvest(&config, &batch, progress.as_mut()).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            return Err(e.into());
        }
    };

    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.path = output.clone();
    }
    if let Some(dir) = &cli.dir {
        config.source.directory = dir.clone();
    }
    if let Some(column) = &cli.column {
        config.source.column = column.clone();
    }

    validate(&config).context("Invalid command-line options")?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber
///
/// The console only shows warnings unless `-v` is given, so log lines do not
/// tear the progress bar. The log file always records at least `info`.
fn setup_logging(verbose: u8, quiet: bool, log_file: &Path) -> anyhow::Result<()> {
    let console_filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pdf_harvest=warn,warn"),
            1 => EnvFilter::new("pdf_harvest=info,warn"),
            2 => EnvFilter::new("pdf_harvest=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };
    let file_filter = if verbose >= 2 {
        EnvFilter::new("pdf_harvest=debug,info")
    } else {
        EnvFilter::new("pdf_harvest=info,warn")
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Handles the --dry-run mode: shows what would be fetched
fn handle_dry_run(batch: &InputBatch) {
    println!("\n=== PDF-Harvest Dry Run ===\n");
    if batch.is_empty() {
        println!("Nothing to fetch.");
        return;
    }
    for (index, url) in batch.iter().enumerate() {
        println!("  {:>3}. {}", index + 1, url);
    }
    println!("\n✓ Would fetch {} URLs", batch.len());
}
