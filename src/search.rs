//! Search gate: decides whether a rule is considered at all in a directory

use crate::result::{NotSearchableReason, SearchResult};
use crate::rule::{Rule, RuleFilter, RuleId, RuleSet};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Snapshot of everything the search gate needs for one rule at one node.
///
/// Contexts are owned values: the evaluator clones and merges the applied
/// sets as it walks, so no two directories ever share one by reference.
#[derive(Debug, Clone)]
pub struct SearchContext {
    depth: usize,
    filter: Arc<RuleFilter>,
    force_nested: bool,
    applied_in_parent: BTreeSet<RuleId>,
    applied_so_far: BTreeSet<RuleId>,
}

impl SearchContext {
    pub fn new(
        depth: usize,
        filter: Arc<RuleFilter>,
        force_nested: bool,
        applied_in_parent: BTreeSet<RuleId>,
        applied_so_far: BTreeSet<RuleId>,
    ) -> Self {
        Self {
            depth,
            filter,
            force_nested,
            applied_in_parent,
            applied_so_far,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn filter(&self) -> &RuleFilter {
        &self.filter
    }

    pub fn force_nested(&self) -> bool {
        self.force_nested
    }

    pub fn applied_in_parent(&self) -> &BTreeSet<RuleId> {
        &self.applied_in_parent
    }

    pub fn applied_so_far(&self) -> &BTreeSet<RuleId> {
        &self.applied_so_far
    }
}

/// Resolves searchability of `rule` within `rule_set`.
///
/// Checks run in a fixed order and the first failing one wins: filter,
/// maximum depth, nesting, then yield relationships.
pub fn evaluate_searchable(rule_set: &RuleSet, rule: &Rule, context: &SearchContext) -> SearchResult {
    if !context.filter.should_include(rule) {
        return SearchResult::NotSearchable(NotSearchableReason::Excluded);
    }

    if let Some(max_depth) = rule.max_depth_limit() {
        if context.depth > max_depth {
            return SearchResult::NotSearchable(NotSearchableReason::MaxDepthExceeded {
                depth: context.depth,
                max_depth,
            });
        }
    }

    if !context.force_nested {
        if !rule.is_nestable() {
            if !context.applied_in_parent.is_empty() {
                return SearchResult::NotSearchable(NotSearchableReason::NotNestable);
            }
        } else if !rule.is_self_nestable() && context.applied_in_parent.contains(rule.id()) {
            return SearchResult::NotSearchable(NotSearchableReason::NotSelfNestable);
        }
    }

    for target in rule_set.yields_to(rule.id()) {
        let applied_here = context.applied_so_far.contains(target);
        let applied_above = !context.force_nested && context.applied_in_parent.contains(target);
        if applied_here || applied_above {
            return SearchResult::NotSearchable(NotSearchableReason::Yielded { to: target.clone() });
        }
    }

    SearchResult::Searchable
}
