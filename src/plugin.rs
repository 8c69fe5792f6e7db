//! The contract every concrete detector implements
//!
//! A plugin is created by its [`Rule`](crate::rule::Rule) for exactly one
//! directory and is owned by exactly one evaluation. The evaluator drives it
//! through three phases:
//!
//! 1. [`Plugin::applicable`] - cheap, read-only check for on-disk evidence
//! 2. [`Plugin::extractable`] - verifies required external tooling
//! 3. [`Plugin::extract`] - the actual parse or tool invocation
//!
//! Plugins may cache what they discover in one phase (a located file, a
//! resolved executable) and reuse it in a later one.

use crate::error::DetectableError;
use crate::forge::Forge;
use crate::result::{CaughtError, PhaseResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait Plugin {
    fn applicable(&mut self) -> PhaseResult;

    /// Must not mutate project state. Domain failures are returned as
    /// [`DetectableError`] and recorded by the evaluator as caught exceptions.
    fn extractable(&mut self) -> Result<PhaseResult, DetectableError>;

    /// Errors are never re-thrown by the evaluator; they become a failed
    /// [`Extraction`].
    fn extract(&mut self, environment: &ExtractionEnvironment) -> anyhow::Result<Extraction>;
}

/// Workspace handed to a plugin during extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionEnvironment {
    output_directory: PathBuf,
}

impl ExtractionEnvironment {
    pub fn new(output_directory: impl Into<PathBuf>) -> Self {
        Self {
            output_directory: output_directory.into(),
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Dependency {
    pub forge: Forge,
    pub name: String,
    pub version: Option<String>,
    /// Declared directly by the project rather than pulled in transitively
    pub direct: bool,
}

impl Dependency {
    pub fn new(forge: Forge, name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            forge,
            name: name.into(),
            version,
            direct: true,
        }
    }

    pub fn transitive(mut self) -> Self {
        self.direct = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionOutcome {
    Success,
    Failure,
    Exception,
}

/// Result of running a plugin's extraction
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub outcome: ExtractionOutcome,
    pub dependencies: Vec<Dependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CaughtError>,
}

impl Extraction {
    pub fn success(dependencies: Vec<Dependency>) -> Self {
        Self {
            outcome: ExtractionOutcome::Success,
            dependencies,
            project_name: None,
            project_version: None,
            description: None,
            error: None,
        }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            outcome: ExtractionOutcome::Failure,
            dependencies: Vec::new(),
            project_name: None,
            project_version: None,
            description: Some(description.into()),
            error: None,
        }
    }

    pub fn exception(error: CaughtError) -> Self {
        Self {
            outcome: ExtractionOutcome::Exception,
            dependencies: Vec::new(),
            project_name: None,
            project_version: None,
            description: None,
            error: Some(error),
        }
    }

    pub fn with_project(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.project_name = Some(name.into());
        self.project_version = version;
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome == ExtractionOutcome::Success
    }

    /// Phase view of this extraction, matching the applicable/extractable taxonomy
    pub fn as_phase_result(&self) -> PhaseResult {
        match (&self.outcome, &self.error) {
            (ExtractionOutcome::Success, _) => PhaseResult::Passed,
            (_, Some(error)) => PhaseResult::ExceptionCaught(error.clone()),
            (_, None) => PhaseResult::failed(
                self.description
                    .clone()
                    .unwrap_or_else(|| "Extraction failed.".to_string()),
            ),
        }
    }
}
