//! Logging-based evaluator listener

use super::EvaluatorListener;
use crate::evaluation::Evaluation;
use crate::result::{PhaseResult, ResultKind};
use tracing::{debug, info, trace, warn};

/// Listener that logs evaluator transitions using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

fn log_phase(evaluation: &Evaluation, phase: &str, result: Option<&PhaseResult>) {
    let rule = evaluation.rule().id();
    let directory = evaluation.directory().display();
    match result.map(PhaseResult::kind) {
        Some(ResultKind::Passed) => {
            debug!(rule = %rule, directory = %directory, phase, "Phase passed");
        }
        Some(ResultKind::Failed) => {
            trace!(rule = %rule, directory = %directory, phase, status = %evaluation.status_message(), "Phase failed");
        }
        Some(ResultKind::ExceptionCaught) => {
            warn!(rule = %rule, directory = %directory, phase, status = %evaluation.status_message(), "Plugin raised an error");
        }
        None => {}
    }
}

impl EvaluatorListener for LoggingListener {
    fn applicable_started(&mut self, evaluation: &Evaluation) {
        trace!(
            rule = %evaluation.rule().id(),
            directory = %evaluation.directory().display(),
            "Checking applicable"
        );
    }

    fn applicable_ended(&mut self, evaluation: &Evaluation) {
        log_phase(evaluation, "applicable", evaluation.applicable());
    }

    fn extractable_started(&mut self, evaluation: &Evaluation) {
        trace!(
            rule = %evaluation.rule().id(),
            directory = %evaluation.directory().display(),
            "Checking extractable"
        );
    }

    fn extractable_ended(&mut self, evaluation: &Evaluation) {
        log_phase(evaluation, "extractable", evaluation.extractable());
    }

    fn extraction_count(&mut self, count: usize) {
        info!(count, "Starting extractions");
    }

    fn extraction_started(&mut self, evaluation: &Evaluation) {
        info!(
            rule = %evaluation.rule().id(),
            directory = %evaluation.directory().display(),
            "Extracting"
        );
    }

    fn extraction_ended(&mut self, evaluation: &Evaluation) {
        match evaluation.extraction() {
            Some(extraction) if extraction.is_success() => {
                info!(
                    rule = %evaluation.rule().id(),
                    dependencies = extraction.dependencies.len(),
                    "Extraction succeeded"
                );
            }
            Some(_) => {
                warn!(
                    rule = %evaluation.rule().id(),
                    directory = %evaluation.directory().display(),
                    status = %evaluation.status_message(),
                    "Extraction did not succeed"
                );
            }
            None => {}
        }
    }
}
