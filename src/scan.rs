//! End-to-end scan: build the tree, evaluate it, summarise it

use crate::config::ScanConfig;
use crate::error::TreeError;
use crate::evaluation::Evaluation;
use crate::evaluator::Evaluator;
use crate::fs::FileSystem;
use crate::listener::{EvaluatorListener, NoOpListener};
use crate::report::ScanSummary;
use crate::rule::RuleSet;
use crate::tree::{EvaluationTree, EvaluationTreeBuilder};
use crate::workspace::ExtractionWorkspaces;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Evaluated tree plus its summary
#[derive(Debug)]
pub struct ScanReport {
    pub tree: EvaluationTree,
    pub summary: ScanSummary,
}

pub struct ScanRunner {
    fs: Arc<dyn FileSystem>,
    rule_set: Arc<RuleSet>,
    config: ScanConfig,
    listener: Box<dyn EvaluatorListener>,
}

impl ScanRunner {
    pub fn new(fs: Arc<dyn FileSystem>, rule_set: Arc<RuleSet>, config: ScanConfig) -> Self {
        Self {
            fs,
            rule_set,
            config,
            listener: Box::new(NoOpListener),
        }
    }

    pub fn with_listener(mut self, listener: impl EvaluatorListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Only tree construction can fail; plugin failures end up in the report
    pub fn run(self, root: &Path) -> Result<ScanReport, TreeError> {
        let start = Instant::now();
        info!(root = %root.display(), "Starting scan");

        let mut tree = EvaluationTreeBuilder::new(self.fs.clone(), self.rule_set.clone())
            .with_config(self.config.tree_config())
            .build(root)?;

        let workspaces = ExtractionWorkspaces::new(&self.config.output_dir);
        let mut evaluator = Evaluator::new(self.config.evaluator_options());
        evaluator.set_listener(self.listener);
        evaluator.evaluate(&mut tree, &mut |evaluation: &Evaluation| {
            workspaces.create(evaluation)
        });

        let summary = ScanSummary::from_tree(&tree);
        info!(
            root = %root.display(),
            applicable = summary.counts.applicable,
            extracted = summary.counts.extracted,
            failed = summary.counts.failed,
            elapsed_ms = start.elapsed().as_millis(),
            "Scan complete"
        );

        Ok(ScanReport { tree, summary })
    }
}
