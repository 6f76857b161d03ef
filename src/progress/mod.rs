//! Progress reporting
//!
//! The orchestrator pushes one fraction per processed item into a
//! [`ProgressSink`]; sinks only observe and never influence the run.
//!
//! - `TerminalProgress`: overwritable status line on stderr
//! - `SilentProgress`: discards everything
//! - `ProgressRecorder`: keeps every update in memory

mod terminal;

pub use terminal::TerminalProgress;

/// Receiver of fractional progress updates
pub trait ProgressSink {
    /// Called once before the first item with the batch size
    fn start(&mut self, total: usize);

    /// Called after each processed item with a value in `[0, 1]`
    fn update(&mut self, fraction: f64);

    /// Called once when the batch is exhausted
    fn finish(&mut self);
}

/// No-op progress sink for headless/test usage.
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn start(&mut self, _total: usize) {}
    fn update(&mut self, _fraction: f64) {}
    fn finish(&mut self) {}
}

/// Progress sink that records every call
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProgressRecorder {
    pub total: Option<usize>,
    pub updates: Vec<f64>,
    pub finished: bool,
}

impl ProgressSink for ProgressRecorder {
    fn start(&mut self, total: usize) {
        self.total = Some(total);
    }

    fn update(&mut self, fraction: f64) {
        self.updates.push(fraction);
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

/// Fraction of the batch completed once item `index` (0-based) is done
///
/// An empty batch counts as already complete.
pub fn fraction_done(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    ((index + 1) as f64 / total as f64).min(1.0)
}
