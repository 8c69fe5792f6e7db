//! The three-pass evaluation engine
//!
//! The tree is walked depth-first, pre-order, three times:
//!
//! 1. search + applicable: decides which rules apply where, threading the set
//!    of already-applied rules down the tree and across siblings in a node
//! 2. extractable: checks tooling for every applicable evaluation
//! 3. extraction: runs the plugins that passed all gates
//!
//! The passes are separate so that applicability is known for the whole tree
//! before slow tool resolution starts, and every extractable gate is known
//! before any extraction side effects happen.
//!
//! Plugin failures never escape: errors and panics are recorded on the
//! evaluation and the walk continues.

use crate::evaluation::Evaluation;
use crate::listener::{EvaluatorListener, NoOpListener};
use crate::plugin::{Extraction, ExtractionEnvironment};
use crate::result::{CaughtError, PhaseResult};
use crate::rule::{RuleFilter, RuleId};
use crate::search::{evaluate_searchable, SearchContext};
use crate::tree::EvaluationTree;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Supplies the workspace for one evaluation during the extraction pass
pub type WorkspaceProvider<'a> = dyn FnMut(&Evaluation) -> anyhow::Result<ExtractionEnvironment> + 'a;

#[derive(Debug, Clone)]
pub struct EvaluatorOptions {
    pub filter: Arc<RuleFilter>,
    /// Ignore nesting restrictions and yields to rules applied in ancestors
    pub force_nested: bool,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            filter: Arc::new(RuleFilter::all()),
            force_nested: false,
        }
    }
}

/// Runs a call into plugin code, turning a panic into a [`CaughtError`]
fn contained<T>(call: impl FnOnce() -> T) -> Result<T, CaughtError> {
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(CaughtError::from_panic)
}

pub struct Evaluator {
    options: EvaluatorOptions,
    listener: Box<dyn EvaluatorListener>,
}

impl Evaluator {
    pub fn new(options: EvaluatorOptions) -> Self {
        Self {
            options,
            listener: Box::new(NoOpListener),
        }
    }

    pub fn with_listener(mut self, listener: impl EvaluatorListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn set_listener(&mut self, listener: Box<dyn EvaluatorListener>) {
        self.listener = listener;
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    /// Runs all three passes over `tree`
    pub fn evaluate(&mut self, tree: &mut EvaluationTree, provider: &mut WorkspaceProvider<'_>) {
        let start = Instant::now();
        self.search_and_applicable(tree, BTreeSet::new());
        info!(
            applicable = count_where(tree, Evaluation::is_applicable),
            elapsed_ms = start.elapsed().as_millis(),
            "Search and applicable pass complete"
        );

        let start = Instant::now();
        self.extractable(tree);
        info!(
            extractable = count_where(tree, Evaluation::is_extractable),
            elapsed_ms = start.elapsed().as_millis(),
            "Extractable pass complete"
        );

        let start = Instant::now();
        self.extraction(tree, provider);
        info!(
            successful = count_where(tree, Evaluation::was_extraction_successful),
            elapsed_ms = start.elapsed().as_millis(),
            "Extraction pass complete"
        );
    }

    /// Decides searchability and applicability for every rule in every node.
    ///
    /// Evaluations are recreated from the rule set on entry, so running the
    /// pass again over an unchanged tree gives the same outcomes.
    pub fn search_and_applicable(
        &mut self,
        tree: &mut EvaluationTree,
        applied_in_parent: BTreeSet<RuleId>,
    ) {
        trace!(directory = %tree.directory().display(), "Determining applicable rules");

        tree.reset_evaluations();
        let depth = tree.depth();
        let directory = tree.directory().to_path_buf();
        let rule_set = tree.rule_set().clone();
        let mut applied_so_far = BTreeSet::new();

        for evaluation in tree.evaluations_mut() {
            self.listener.applicable_started(evaluation);

            let context = SearchContext::new(
                depth,
                self.options.filter.clone(),
                self.options.force_nested,
                applied_in_parent.clone(),
                applied_so_far.clone(),
            );
            let searchable = evaluate_searchable(&rule_set, evaluation.rule(), &context);
            evaluation.set_search_context(context);
            evaluation.set_searchable(searchable);

            if evaluation.is_searchable() {
                let created = contained(|| evaluation.rule().create_plugin(&directory));
                match created {
                    Ok(mut plugin) => {
                        let applicable = contained(|| plugin.applicable())
                            .unwrap_or_else(PhaseResult::ExceptionCaught);
                        evaluation.set_plugin(plugin);
                        evaluation.set_applicable(applicable);
                    }
                    Err(error) => evaluation.set_applicable(PhaseResult::ExceptionCaught(error)),
                }

                if evaluation.is_applicable() {
                    trace!(rule = %evaluation.rule().id(), "Found applicable rule");
                    applied_so_far.insert(evaluation.rule().id().clone());
                } else {
                    trace!(rule = %evaluation.rule().id(), status = %evaluation.status_message(), "Applicable did not pass");
                }
            } else {
                trace!(rule = %evaluation.rule().id(), status = %evaluation.status_message(), "Searchable did not pass");
            }

            self.listener.applicable_ended(evaluation);
        }

        if !applied_so_far.is_empty() {
            info!(
                count = applied_so_far.len(),
                directory = %directory.display(),
                "Found applicable rules"
            );
        }

        let mut next_applied_in_parent = applied_in_parent;
        next_applied_in_parent.extend(applied_so_far);

        for child in tree.children_mut() {
            self.search_and_applicable(child, next_applied_in_parent.clone());
        }
    }

    /// Checks tooling for every applicable evaluation.
    ///
    /// A rule that falls back from another rule in the same node is skipped
    /// when that primary is extractable.
    pub fn extractable(&mut self, tree: &mut EvaluationTree) {
        trace!(directory = %tree.directory().display(), "Determining extractable rules");

        let rule_set = tree.rule_set().clone();
        let evaluations = tree.evaluations_mut();

        for index in 0..evaluations.len() {
            if !evaluations[index].is_applicable() {
                continue;
            }

            let primary = rule_set
                .fallback_from(evaluations[index].rule().id())
                .filter(|primary| {
                    evaluations
                        .iter()
                        .any(|other| other.rule().id() == *primary && other.is_extractable())
                })
                .cloned();

            let evaluation = &mut evaluations[index];
            self.listener.extractable_started(evaluation);

            let result = match primary {
                Some(primary) => PhaseResult::failed(format!("{} is extractable", primary)),
                None => match evaluation.plugin_mut() {
                    Some(plugin) => match contained(|| plugin.extractable()) {
                        Ok(Ok(result)) => result,
                        Ok(Err(error)) => PhaseResult::exception(error.into()),
                        Err(panic) => PhaseResult::ExceptionCaught(panic),
                    },
                    None => PhaseResult::failed("No plugin was created"),
                },
            };
            evaluation.set_extractable(result);

            if evaluation.is_extractable() {
                trace!(rule = %evaluation.rule().id(), "Extractable passed");
            } else {
                debug!(
                    rule = %evaluation.rule().id(),
                    directory = %evaluation.directory().display(),
                    status = %evaluation.status_message(),
                    "Extractable did not pass"
                );
            }

            self.listener.extractable_ended(evaluation);
        }

        for child in tree.children_mut() {
            self.extractable(child);
        }
    }

    /// Number of evaluations the extraction pass will run
    pub fn count_extractions(tree: &EvaluationTree) -> usize {
        count_where(tree, Evaluation::is_extractable)
    }

    /// Runs every extractable plugin, reporting the total to the listener first
    pub fn extraction(&mut self, tree: &mut EvaluationTree, provider: &mut WorkspaceProvider<'_>) {
        let count = Self::count_extractions(tree);
        info!(count, "Performing extractions");
        self.listener.extraction_count(count);
        self.extract_node(tree, provider);
    }

    fn extract_node(&mut self, tree: &mut EvaluationTree, provider: &mut WorkspaceProvider<'_>) {
        trace!(directory = %tree.directory().display(), "Extracting rules");

        for evaluation in tree.evaluations_mut() {
            if !evaluation.is_extractable() || evaluation.was_extraction_attempted() {
                continue;
            }

            let environment = match evaluation.extraction_environment() {
                Some(environment) => Ok(environment.clone()),
                None => {
                    let provided = contained(|| provider(evaluation))
                        .map_err(|panic| panic.error().to_string())
                        .and_then(|result| result.map_err(|error| format!("{:#}", error)));
                    if let Ok(environment) = &provided {
                        evaluation.set_extraction_environment(environment.clone());
                    }
                    provided
                }
            };

            self.listener.extraction_started(evaluation);

            let extraction = match environment {
                Ok(environment) => match evaluation.plugin_mut() {
                    Some(plugin) => match contained(|| plugin.extract(&environment)) {
                        Ok(Ok(extraction)) => extraction,
                        Ok(Err(error)) => Extraction::exception(CaughtError::new(error)),
                        Err(panic) => Extraction::exception(panic),
                    },
                    None => Extraction::failure("No plugin was created"),
                },
                Err(message) => Extraction::exception(CaughtError::new(anyhow::anyhow!(
                    "Failed to prepare extraction workspace: {}",
                    message
                ))),
            };
            evaluation.set_extraction(extraction);

            self.listener.extraction_ended(evaluation);
            trace!(
                rule = %evaluation.rule().id(),
                successful = evaluation.was_extraction_successful(),
                "Extraction finished"
            );
        }

        for child in tree.children_mut() {
            self.extract_node(child, provider);
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvaluatorOptions::default())
    }
}

fn count_where(tree: &EvaluationTree, predicate: impl Fn(&Evaluation) -> bool) -> usize {
    tree.all_evaluations()
        .filter(|(_, evaluation)| predicate(evaluation))
        .count()
}
