//! Observers notified while the evaluator walks the tree

mod logging;
mod progress;

pub use logging::LoggingListener;
pub use progress::ProgressListener;

use crate::evaluation::Evaluation;

/// Receives phase transitions from the evaluator.
///
/// Every hook has an empty default so observers only implement what they
/// care about. `*_ended` hooks see the evaluation after its result has been
/// recorded.
pub trait EvaluatorListener {
    fn applicable_started(&mut self, _evaluation: &Evaluation) {}

    fn applicable_ended(&mut self, _evaluation: &Evaluation) {}

    fn extractable_started(&mut self, _evaluation: &Evaluation) {}

    fn extractable_ended(&mut self, _evaluation: &Evaluation) {}

    /// Number of extractions the extraction pass is about to perform
    fn extraction_count(&mut self, _count: usize) {}

    fn extraction_started(&mut self, _evaluation: &Evaluation) {}

    fn extraction_ended(&mut self, _evaluation: &Evaluation) {}
}

/// Observer that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpListener;

impl EvaluatorListener for NoOpListener {}

/// Forwards every event to each listener in turn
#[derive(Default)]
pub struct CompositeListener {
    listeners: Vec<Box<dyn EvaluatorListener>>,
}

impl CompositeListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, listener: impl EvaluatorListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl EvaluatorListener for CompositeListener {
    fn applicable_started(&mut self, evaluation: &Evaluation) {
        self.listeners
            .iter_mut()
            .for_each(|l| l.applicable_started(evaluation));
    }

    fn applicable_ended(&mut self, evaluation: &Evaluation) {
        self.listeners
            .iter_mut()
            .for_each(|l| l.applicable_ended(evaluation));
    }

    fn extractable_started(&mut self, evaluation: &Evaluation) {
        self.listeners
            .iter_mut()
            .for_each(|l| l.extractable_started(evaluation));
    }

    fn extractable_ended(&mut self, evaluation: &Evaluation) {
        self.listeners
            .iter_mut()
            .for_each(|l| l.extractable_ended(evaluation));
    }

    fn extraction_count(&mut self, count: usize) {
        self.listeners
            .iter_mut()
            .for_each(|l| l.extraction_count(count));
    }

    fn extraction_started(&mut self, evaluation: &Evaluation) {
        self.listeners
            .iter_mut()
            .for_each(|l| l.extraction_started(evaluation));
    }

    fn extraction_ended(&mut self, evaluation: &Evaluation) {
        self.listeners
            .iter_mut()
            .for_each(|l| l.extraction_ended(evaluation));
    }
}
