//! Terminal progress bar
//!
//! Renders `<label> [####------] 40.00% - 1.234s` on one overwritable line and
//! `<label> is complete in 2.345s` once the batch is done.

use crate::progress::ProgressSink;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::fmt::Write;
use std::time::{Duration, Instant};

/// Number of bar positions a full batch maps onto
const RESOLUTION: u64 = 10_000;

/// Total width budget shared by the label and the bar
const LINE_WIDTH: usize = 40;

/// Narrowest bar drawn regardless of label length
const MIN_BAR_WIDTH: usize = 10;

/// Progress sink drawing an indicatif bar
pub struct TerminalProgress {
    label: String,
    bar_width: usize,
    draw_to_stderr: bool,
    bar: Option<ProgressBar>,
    started: Option<Instant>,
    last: f64,
}

impl TerminalProgress {
    /// Creates a bar drawing to stderr
    pub fn new(label: impl Into<String>) -> Self {
        Self::build(label.into(), true)
    }

    /// Creates a bar that tracks state without drawing anything
    pub fn hidden(label: impl Into<String>) -> Self {
        Self::build(label.into(), false)
    }

    fn build(label: String, draw_to_stderr: bool) -> Self {
        let bar_width = LINE_WIDTH
            .saturating_sub(label.chars().count())
            .max(MIN_BAR_WIDTH);
        Self {
            label,
            bar_width,
            draw_to_stderr,
            bar: None,
            started: None,
            last: 0.0,
        }
    }

    /// Width of the bar itself, excluding label and brackets
    pub fn bar_width(&self) -> usize {
        self.bar_width
    }

    /// Last fraction drawn
    pub fn fraction(&self) -> f64 {
        self.last
    }

    /// Time since `start`, zero if the bar has not started
    pub fn elapsed(&self) -> Duration {
        self.started.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        self.bar.as_ref().is_some_and(|bar| bar.is_finished())
    }

    fn running_style(&self) -> ProgressStyle {
        let template = format!(
            "{{prefix}} [{{bar:{}}}] {{percent_2dp}} - {{seconds}}",
            self.bar_width
        );
        ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#-")
            .with_key("percent_2dp", |state: &ProgressState, w: &mut dyn Write| {
                let _ = write!(w, "{:.2}%", state.fraction() * 100.0);
            })
            .with_key("seconds", |state: &ProgressState, w: &mut dyn Write| {
                let _ = write!(w, "{:.3}s", state.elapsed().as_secs_f64());
            })
    }

    fn finished_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl ProgressSink for TerminalProgress {
    fn start(&mut self, _total: usize) {
        let target = if self.draw_to_stderr {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(RESOLUTION), target);
        bar.set_style(self.running_style());
        bar.set_prefix(self.label.clone());

        self.started = Some(Instant::now());
        self.last = 0.0;
        self.bar = Some(bar);
    }

    fn update(&mut self, fraction: f64) {
        if self.bar.is_none() {
            self.start(0);
        }
        // Never move backwards, never overshoot.
        self.last = fraction.clamp(0.0, 1.0).max(self.last);
        if let Some(bar) = &self.bar {
            bar.set_position((self.last * RESOLUTION as f64).round() as u64);
        }
    }

    fn finish(&mut self) {
        if self.bar.is_none() {
            self.start(0);
        }
        self.last = 1.0;
        let elapsed = self.elapsed();
        if let Some(bar) = &self.bar {
            bar.set_position(RESOLUTION);
            bar.set_style(Self::finished_style());
            bar.finish_with_message(format!(
                "is complete in {:.3}s",
                elapsed.as_secs_f64()
            ));
        }
    }
}
