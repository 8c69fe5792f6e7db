//! Scan summary built from an evaluated tree

use crate::evaluation::Evaluation;
use crate::plugin::{Dependency, Extraction};
use crate::rule::RuleId;
use crate::tree::EvaluationTree;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryRules {
    pub directory: PathBuf,
    pub rules: Vec<RuleId>,
}

/// An applicable evaluation that could not be extracted
#[derive(Debug, Clone, Serialize)]
pub struct PreparationIssue {
    pub directory: PathBuf,
    pub rule: RuleId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionIssue {
    pub directory: PathBuf,
    pub rule: RuleId,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub directory: PathBuf,
    pub rule: RuleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub dependency_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanCounts {
    pub directories: usize,
    pub evaluations: usize,
    pub applicable: usize,
    pub extractable: usize,
    pub extracted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub root: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub counts: ScanCounts,
    pub applicable: Vec<DirectoryRules>,
    pub preparation_issues: Vec<PreparationIssue>,
    pub extraction_issues: Vec<ExtractionIssue>,
    pub projects: Vec<ProjectSummary>,
    /// Union of all successful extractions, sorted and deduplicated
    pub dependencies: Vec<Dependency>,
}

fn extraction_message(extraction: &Extraction) -> String {
    match (&extraction.error, &extraction.description) {
        (Some(error), _) => format!("Exception: {}", error),
        (None, Some(description)) => description.clone(),
        (None, None) => "Extraction failed.".to_string(),
    }
}

impl ScanSummary {
    pub fn from_tree(tree: &EvaluationTree) -> Self {
        let mut counts = ScanCounts::default();
        let mut applicable = Vec::new();
        let mut preparation_issues = Vec::new();
        let mut extraction_issues = Vec::new();
        let mut projects = Vec::new();
        let mut dependencies = BTreeSet::new();

        for node in tree.iter() {
            counts.directories += 1;
            counts.evaluations += node.evaluations().len();

            let rules: Vec<RuleId> = node
                .evaluations()
                .iter()
                .filter(|evaluation| evaluation.is_applicable())
                .map(|evaluation| evaluation.rule().id().clone())
                .collect();
            if !rules.is_empty() {
                applicable.push(DirectoryRules {
                    directory: node.directory().to_path_buf(),
                    rules,
                });
            }

            for evaluation in node.evaluations() {
                summarize(
                    node,
                    evaluation,
                    &mut counts,
                    &mut preparation_issues,
                    &mut extraction_issues,
                    &mut projects,
                    &mut dependencies,
                );
            }
        }

        Self {
            root: tree.directory().to_path_buf(),
            generated_at: Utc::now(),
            counts,
            applicable,
            preparation_issues,
            extraction_issues,
            projects,
            dependencies: dependencies.into_iter().collect(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.preparation_issues.is_empty() && self.extraction_issues.is_empty()
    }
}

fn summarize(
    node: &EvaluationTree,
    evaluation: &Evaluation,
    counts: &mut ScanCounts,
    preparation_issues: &mut Vec<PreparationIssue>,
    extraction_issues: &mut Vec<ExtractionIssue>,
    projects: &mut Vec<ProjectSummary>,
    dependencies: &mut BTreeSet<Dependency>,
) {
    if !evaluation.is_applicable() {
        return;
    }
    counts.applicable += 1;
    let directory = evaluation.directory().to_path_buf();
    let rule = evaluation.rule().id().clone();

    if !evaluation.is_extractable() {
        // a fallback standing down for its primary is not an issue
        if let Some(result) = evaluation.extractable() {
            if !primary_extractable(node, evaluation) {
                preparation_issues.push(PreparationIssue {
                    directory,
                    rule,
                    reason: result.to_string(),
                });
            }
        }
        return;
    }
    counts.extractable += 1;

    let Some(extraction) = evaluation.extraction() else {
        return;
    };
    if extraction.is_success() {
        counts.extracted += 1;
        dependencies.extend(extraction.dependencies.iter().cloned());
        projects.push(ProjectSummary {
            directory,
            rule,
            name: extraction.project_name.clone(),
            version: extraction.project_version.clone(),
            dependency_count: extraction.dependencies.len(),
        });
    } else {
        counts.failed += 1;
        extraction_issues.push(ExtractionIssue {
            directory,
            rule,
            message: extraction_message(extraction),
        });
    }
}

fn primary_extractable(node: &EvaluationTree, evaluation: &Evaluation) -> bool {
    node.rule_set()
        .fallback_from(evaluation.rule().id())
        .and_then(|primary| node.evaluation_for(primary.as_str()))
        .is_some_and(Evaluation::is_extractable)
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scan of {}", self.root.display())?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(
            f,
            "Directories: {}  Evaluations: {}  Applicable: {}  Extractable: {}",
            self.counts.directories,
            self.counts.evaluations,
            self.counts.applicable,
            self.counts.extractable
        )?;
        writeln!(
            f,
            "Extracted: {}  Failed: {}",
            self.counts.extracted, self.counts.failed
        )?;

        if !self.applicable.is_empty() {
            writeln!(f)?;
            writeln!(f, "Applicable rules:")?;
            for entry in &self.applicable {
                let rules: Vec<&str> = entry.rules.iter().map(RuleId::as_str).collect();
                writeln!(f, "  {}: {}", entry.directory.display(), rules.join(", "))?;
            }
        }

        if !self.projects.is_empty() {
            writeln!(f)?;
            writeln!(f, "Projects:")?;
            for project in &self.projects {
                let name = project.name.as_deref().unwrap_or("<unnamed>");
                match project.version {
                    Some(ref version) => write!(f, "  {} {}", name, version)?,
                    None => write!(f, "  {}", name)?,
                }
                writeln!(
                    f,
                    " ({}, {} dependencies) in {}",
                    project.rule,
                    project.dependency_count,
                    project.directory.display()
                )?;
            }
        }

        if !self.preparation_issues.is_empty() {
            writeln!(f)?;
            writeln!(f, "Not extractable:")?;
            for issue in &self.preparation_issues {
                writeln!(
                    f,
                    "  {} in {}: {}",
                    issue.rule,
                    issue.directory.display(),
                    issue.reason
                )?;
            }
        }

        if !self.extraction_issues.is_empty() {
            writeln!(f)?;
            writeln!(f, "Extraction errors:")?;
            for issue in &self.extraction_issues {
                writeln!(
                    f,
                    "  {} in {}: {}",
                    issue.rule,
                    issue.directory.display(),
                    issue.message
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Dependencies ({}):", self.dependencies.len())?;
        for dependency in &self.dependencies {
            let version = dependency.version.as_deref().unwrap_or("*");
            let scope = if dependency.direct { "" } else { " (transitive)" };
            writeln!(
                f,
                "  {}:{}@{}{}",
                dependency.forge, dependency.name, version, scope
            )?;
        }
        Ok(())
    }
}
