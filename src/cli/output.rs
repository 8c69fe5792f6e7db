//! Output formatting for scan summaries and the rule listing

use crate::report::ScanSummary;
use crate::rule::{RuleId, RuleSet};
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

/// Serializable view of one rule and its relationships
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub id: RuleId,
    pub name: String,
    pub group: String,
    pub nestable: bool,
    pub self_nestable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub yields_to: Vec<RuleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_for: Option<RuleId>,
}

impl RuleInfo {
    pub fn from_rule_set(rule_set: &RuleSet) -> Vec<Self> {
        rule_set
            .ordered_rules()
            .iter()
            .map(|rule| Self {
                id: rule.id().clone(),
                name: rule.descriptive_name().to_string(),
                group: rule.group().to_string(),
                nestable: rule.is_nestable(),
                self_nestable: rule.is_self_nestable(),
                max_depth: rule.max_depth_limit(),
                yields_to: rule_set.yields_to(rule.id()).to_vec(),
                fallback_for: rule_set.fallback_from(rule.id()).cloned(),
            })
            .collect()
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_summary(&self, summary: &ScanSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(summary)
                .context("Failed to serialize scan summary to JSON"),
            OutputFormat::Human => Ok(summary.to_string()),
        }
    }

    pub fn format_rules(&self, rule_set: &RuleSet) -> Result<String> {
        let rules = RuleInfo::from_rule_set(rule_set);
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&rules).context("Failed to serialize rules to JSON")
            }
            OutputFormat::Human => Ok(self.format_rules_human(&rules)),
        }
    }

    fn format_rules_human(&self, rules: &[RuleInfo]) -> String {
        let mut output = String::new();
        output.push_str(&format!("Rules ({}), in evaluation order:\n", rules.len()));
        output.push_str(&"=".repeat(60));
        output.push('\n');

        for rule in rules {
            output.push_str(&format!("{:<20} {} [{}]\n", rule.id.as_str(), rule.name, rule.group));

            let mut traits = Vec::new();
            if !rule.nestable {
                traits.push("not nestable".to_string());
            } else if rule.self_nestable {
                traits.push("self-nestable".to_string());
            }
            if let Some(depth) = rule.max_depth {
                traits.push(format!("max depth {}", depth));
            }
            if !traits.is_empty() {
                output.push_str(&format!("{:<20} {}\n", "", traits.join(", ")));
            }
            if !rule.yields_to.is_empty() {
                let targets: Vec<&str> = rule.yields_to.iter().map(RuleId::as_str).collect();
                output.push_str(&format!("{:<20} yields to {}\n", "", targets.join(", ")));
            }
            if let Some(ref primary) = rule.fallback_for {
                output.push_str(&format!("{:<20} fallback for {}\n", "", primary));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::test_support::passing_rule;

    fn rule_set() -> RuleSet {
        RuleSet::builder()
            .add_rule(passing_rule("primary").with_group("Build"))
            .add_rule(passing_rule("secondary").nestable(false))
            .add_rule(passing_rule("lock"))
            .yield_to("lock", "primary")
            .fallback("primary", "secondary")
            .build()
            .unwrap()
    }

    #[test]
    fn test_rule_info() {
        let rules = RuleInfo::from_rule_set(&rule_set());
        let lock = rules.iter().find(|r| r.id.as_str() == "lock").unwrap();
        assert_eq!(lock.yields_to, vec![RuleId::new("primary")]);

        let secondary = rules.iter().find(|r| r.id.as_str() == "secondary").unwrap();
        assert_eq!(secondary.fallback_for, Some(RuleId::new("primary")));
        assert!(!secondary.nestable);
    }

    #[test]
    fn test_format_rules_human() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_rules(&rule_set())
            .unwrap();
        assert!(output.contains("Rules (3)"));
        assert!(output.contains("[Build]"));
        assert!(output.contains("yields to primary"));
        assert!(output.contains("fallback for primary"));
        assert!(output.contains("not nestable"));
    }

    #[test]
    fn test_format_rules_json() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_rules(&rule_set())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
        assert_eq!(value[0]["id"], "primary");
        assert!(value[0].get("yields_to").is_none());
    }
}
