//! Directory-shaped tree of evaluations

mod builder;

pub use builder::{EvaluationTreeBuilder, TreeConfig, DEFAULT_EXCLUDED_DIRECTORIES};

use crate::evaluation::Evaluation;
use crate::rule::RuleSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One directory of the scanned project.
///
/// The builder fixes `directory`, `depth`, the rule set and the children; the
/// evaluator recreates `evaluations` at the start of every search pass, in the
/// rule set's evaluation order.
#[derive(Debug)]
pub struct EvaluationTree {
    directory: PathBuf,
    depth: usize,
    rule_set: Arc<RuleSet>,
    evaluations: Vec<Evaluation>,
    children: Vec<EvaluationTree>,
}

impl EvaluationTree {
    pub fn new(
        directory: impl Into<PathBuf>,
        depth: usize,
        rule_set: Arc<RuleSet>,
        children: Vec<EvaluationTree>,
    ) -> Self {
        Self {
            directory: directory.into(),
            depth,
            rule_set,
            evaluations: Vec::new(),
            children,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn rule_set(&self) -> &Arc<RuleSet> {
        &self.rule_set
    }

    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn children(&self) -> &[EvaluationTree] {
        &self.children
    }

    pub(crate) fn evaluations_mut(&mut self) -> &mut [Evaluation] {
        &mut self.evaluations
    }

    pub(crate) fn children_mut(&mut self) -> &mut [EvaluationTree] {
        &mut self.children
    }

    pub(crate) fn reset_evaluations(&mut self) {
        let directory = &self.directory;
        self.evaluations = self
            .rule_set
            .ordered_rules()
            .iter()
            .map(|rule| Evaluation::new(rule.clone(), directory.clone()))
            .collect();
    }

    /// Pre-order iterator over this node and all descendants
    pub fn iter(&self) -> impl Iterator<Item = &EvaluationTree> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    pub fn all_evaluations(&self) -> impl Iterator<Item = (&EvaluationTree, &Evaluation)> {
        self.iter()
            .flat_map(|node| node.evaluations.iter().map(move |evaluation| (node, evaluation)))
    }

    /// Finds the node for `directory` anywhere in this subtree
    pub fn find(&self, directory: &Path) -> Option<&EvaluationTree> {
        self.iter().find(|node| node.directory == directory)
    }

    pub fn evaluation_for(&self, rule_id: &str) -> Option<&Evaluation> {
        self.evaluations
            .iter()
            .find(|evaluation| evaluation.rule().id().as_str() == rule_id)
    }
}
