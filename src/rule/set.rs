use super::{Rule, RuleId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleSetError {
    #[error("Rule {0} was added more than once")]
    DuplicateRule(RuleId),

    #[error("Rule {rule} references unknown rule {unknown}")]
    UnknownRule { rule: RuleId, unknown: RuleId },

    #[error("Rule {0} cannot be related to itself")]
    SelfRelationship(RuleId),

    #[error("Rule {rule} already falls back from {existing}")]
    ConflictingFallback { rule: RuleId, existing: RuleId },

    #[error("Rule relationships form a cycle through: {}", .0.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", "))]
    Cycle(Vec<RuleId>),
}

/// Rules applicable at a tree node plus the relationships between them.
///
/// The evaluation order is fixed when the set is built: every rule comes after
/// the rules it yields to and after the primary it falls back from, and
/// unrelated rules keep their registration order.
#[derive(Debug)]
pub struct RuleSet {
    ordered: Vec<Arc<Rule>>,
    yields_to: HashMap<RuleId, Vec<RuleId>>,
    fallback_from: HashMap<RuleId, RuleId>,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// Rules in evaluation order
    pub fn ordered_rules(&self) -> &[Arc<Rule>] {
        &self.ordered
    }

    pub fn get(&self, id: &RuleId) -> Option<&Arc<Rule>> {
        self.ordered.iter().find(|rule| rule.id() == id)
    }

    pub fn yields_to(&self, id: &RuleId) -> &[RuleId] {
        self.yields_to.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Primary rule that `id` is a fallback for, if any
    pub fn fallback_from(&self, id: &RuleId) -> Option<&RuleId> {
        self.fallback_from.get(id)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[derive(Default)]
pub struct RuleSetBuilder {
    rules: Vec<Arc<Rule>>,
    yields: Vec<(RuleId, RuleId)>,
    fallbacks: Vec<(RuleId, RuleId)>,
}

impl RuleSetBuilder {
    pub fn add_rule(mut self, rule: Rule) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn add_shared_rule(mut self, rule: Arc<Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// `rule` is not searchable wherever `target` already applied
    pub fn yield_to(mut self, rule: impl Into<RuleId>, target: impl Into<RuleId>) -> Self {
        self.yields.push((rule.into(), target.into()));
        self
    }

    /// `fallback` is only extracted when `primary` is not extractable
    pub fn fallback(mut self, primary: impl Into<RuleId>, fallback: impl Into<RuleId>) -> Self {
        self.fallbacks.push((fallback.into(), primary.into()));
        self
    }

    pub fn build(self) -> Result<RuleSet, RuleSetError> {
        let mut index: HashMap<RuleId, usize> = HashMap::new();
        for (i, rule) in self.rules.iter().enumerate() {
            if index.insert(rule.id().clone(), i).is_some() {
                return Err(RuleSetError::DuplicateRule(rule.id().clone()));
            }
        }

        let check = |rule: &RuleId, other: &RuleId| -> Result<(), RuleSetError> {
            for id in [rule, other] {
                if !index.contains_key(id) {
                    return Err(RuleSetError::UnknownRule {
                        rule: if id == rule { other.clone() } else { rule.clone() },
                        unknown: id.clone(),
                    });
                }
            }
            if rule == other {
                return Err(RuleSetError::SelfRelationship(rule.clone()));
            }
            Ok(())
        };

        let mut yields_to: HashMap<RuleId, Vec<RuleId>> = HashMap::new();
        for (rule, target) in &self.yields {
            check(rule, target)?;
            let targets = yields_to.entry(rule.clone()).or_default();
            if !targets.contains(target) {
                targets.push(target.clone());
            }
        }

        let mut fallback_from: HashMap<RuleId, RuleId> = HashMap::new();
        for (fallback, primary) in &self.fallbacks {
            check(fallback, primary)?;
            if let Some(existing) = fallback_from.get(fallback) {
                if existing != primary {
                    return Err(RuleSetError::ConflictingFallback {
                        rule: fallback.clone(),
                        existing: existing.clone(),
                    });
                }
            }
            fallback_from.insert(fallback.clone(), primary.clone());
        }

        // Edge predecessor -> successor: successor must be evaluated later.
        let count = self.rules.len();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut in_degree = vec![0usize; count];
        let edges = yields_to
            .iter()
            .flat_map(|(rule, targets)| targets.iter().map(move |t| (t, rule)))
            .chain(fallback_from.iter().map(|(fallback, primary)| (primary, fallback)));
        for (before, after) in edges {
            let (b, a) = (index[before], index[after]);
            if !successors[b].contains(&a) {
                successors[b].push(a);
                in_degree[a] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(count);
        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &succ in &successors[next] {
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    ready.insert(succ);
                }
            }
        }

        if order.len() != count {
            let cyclic = (0..count)
                .filter(|i| in_degree[*i] > 0)
                .map(|i| self.rules[i].id().clone())
                .collect();
            return Err(RuleSetError::Cycle(cyclic));
        }

        let ordered = order.into_iter().map(|i| self.rules[i].clone()).collect();

        Ok(RuleSet {
            ordered,
            yields_to,
            fallback_from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::test_support::passing_rule;

    fn ids(set: &RuleSet) -> Vec<&str> {
        set.ordered_rules().iter().map(|r| r.id().as_str()).collect()
    }

    #[test]
    fn test_unrelated_rules_keep_registration_order() {
        let set = RuleSet::builder()
            .add_rule(passing_rule("c"))
            .add_rule(passing_rule("a"))
            .add_rule(passing_rule("b"))
            .build()
            .unwrap();
        assert_eq!(ids(&set), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_yielding_rule_ordered_after_target() {
        let set = RuleSet::builder()
            .add_rule(passing_rule("go-dep-lock"))
            .add_rule(passing_rule("gradle"))
            .add_rule(passing_rule("go-mod"))
            .yield_to("go-dep-lock", "go-mod")
            .build()
            .unwrap();
        assert_eq!(ids(&set), vec!["gradle", "go-mod", "go-dep-lock"]);
        assert_eq!(set.yields_to(&RuleId::new("go-dep-lock")), &[RuleId::new("go-mod")]);
        assert!(set.yields_to(&RuleId::new("go-mod")).is_empty());
    }

    #[test]
    fn test_fallback_ordered_after_primary() {
        let set = RuleSet::builder()
            .add_rule(passing_rule("gradle-parse"))
            .add_rule(passing_rule("gradle-inspector"))
            .fallback("gradle-inspector", "gradle-parse")
            .build()
            .unwrap();
        assert_eq!(ids(&set), vec!["gradle-inspector", "gradle-parse"]);
        assert_eq!(
            set.fallback_from(&RuleId::new("gradle-parse")),
            Some(&RuleId::new("gradle-inspector"))
        );
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let err = RuleSet::builder()
            .add_rule(passing_rule("a"))
            .add_rule(passing_rule("a"))
            .build()
            .unwrap_err();
        assert_eq!(err, RuleSetError::DuplicateRule(RuleId::new("a")));
    }

    #[test]
    fn test_unknown_relationship_target_rejected() {
        let err = RuleSet::builder()
            .add_rule(passing_rule("a"))
            .yield_to("a", "missing")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RuleSetError::UnknownRule {
                rule: RuleId::new("a"),
                unknown: RuleId::new("missing"),
            }
        );
    }

    #[test]
    fn test_self_relationship_rejected() {
        let err = RuleSet::builder()
            .add_rule(passing_rule("a"))
            .yield_to("a", "a")
            .build()
            .unwrap_err();
        assert_eq!(err, RuleSetError::SelfRelationship(RuleId::new("a")));
    }

    #[test]
    fn test_conflicting_fallback_rejected() {
        let err = RuleSet::builder()
            .add_rule(passing_rule("a"))
            .add_rule(passing_rule("b"))
            .add_rule(passing_rule("c"))
            .fallback("a", "c")
            .fallback("b", "c")
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleSetError::ConflictingFallback { .. }));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = RuleSet::builder()
            .add_rule(passing_rule("a"))
            .add_rule(passing_rule("b"))
            .add_rule(passing_rule("c"))
            .yield_to("a", "b")
            .yield_to("b", "a")
            .build()
            .unwrap_err();
        assert_eq!(err, RuleSetError::Cycle(vec![RuleId::new("a"), RuleId::new("b")]));
        assert!(err.to_string().contains("a, b"));
    }
}
