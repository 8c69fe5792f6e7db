use super::Rule;
use serde::Serialize;

/// Inclusion/exclusion filter over rules.
///
/// Entries match either a rule id or a rule group, case-insensitively.
/// Exclusion wins over inclusion; an empty inclusion list includes everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleFilter {
    included: Vec<String>,
    excluded: Vec<String>,
}

impl RuleFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(included: Vec<String>, excluded: Vec<String>) -> Self {
        Self { included, excluded }
    }

    pub fn should_include(&self, rule: &Rule) -> bool {
        if self.excluded.iter().any(|entry| Self::matches(entry, rule)) {
            return false;
        }
        self.included.is_empty() || self.included.iter().any(|entry| Self::matches(entry, rule))
    }

    fn matches(entry: &str, rule: &Rule) -> bool {
        entry.eq_ignore_ascii_case(rule.id().as_str()) || entry.eq_ignore_ascii_case(rule.group())
    }
}
