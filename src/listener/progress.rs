//! Terminal progress bar over the extraction pass

use super::EvaluatorListener;
use crate::evaluation::Evaluation;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TEMPLATE: &str = "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}";

/// Shows one tick per finished extraction
pub struct ProgressListener {
    bar: ProgressBar,
}

impl ProgressListener {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    /// Listener whose bar never draws, for tests and non-interactive output
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::with_draw_target(
            Some(0),
            ProgressDrawTarget::hidden(),
        ))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}

impl Default for ProgressListener {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluatorListener for ProgressListener {
    fn extraction_count(&mut self, count: usize) {
        self.bar.set_length(count as u64);
        self.bar.set_position(0);
    }

    fn extraction_started(&mut self, evaluation: &Evaluation) {
        self.bar.set_message(format!(
            "{} in {}",
            evaluation.rule().descriptive_name(),
            evaluation.directory().display()
        ));
    }

    fn extraction_ended(&mut self, _evaluation: &Evaluation) {
        self.bar.inc(1);
        if self.bar.length() == Some(self.bar.position()) {
            self.bar.finish_with_message("Extractions complete");
        }
    }
}
