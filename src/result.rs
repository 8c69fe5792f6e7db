//! Outcome types recorded for every phase of a rule evaluation
//!
//! Every (rule, directory) pair ends up with one of these outcomes per phase:
//! the search gate produces a [`SearchResult`], while applicable and
//! extractable produce a [`PhaseResult`]. Reporting distinguishes
//! [`PhaseResult::Failed`] (the environment lacks something) from
//! [`PhaseResult::ExceptionCaught`] (the plugin itself broke).

use crate::rule::RuleId;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Why a phase did not pass even though the plugin behaved correctly
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "kebab-case")]
pub enum FailureReason {
    #[error("A file was not found: {0}")]
    FileNotFound(String),

    #[error("No {0} executable was found")]
    ExecutableNotFound(String),

    #[error("The {0} tool could not be located or installed")]
    ToolNotFound(String),

    #[error("{0}")]
    Generic(String),
}

/// An error or panic contained at the plugin boundary
#[derive(Debug, Clone)]
pub struct CaughtError(Arc<anyhow::Error>);

impl CaughtError {
    pub fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }

    /// Converts a panic payload from `catch_unwind` into an error
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::new(anyhow::anyhow!("plugin panicked: {}", message))
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.0
    }
}

impl Serialize for CaughtError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl fmt::Display for CaughtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

/// Outcome of the applicable or extractable phase
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "kebab-case")]
pub enum PhaseResult {
    Passed,
    Failed(FailureReason),
    ExceptionCaught(CaughtError),
}

/// Coarse classification of a [`PhaseResult`], cheap to compare and serialise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultKind {
    Passed,
    Failed,
    ExceptionCaught,
}

impl PhaseResult {
    pub fn file_not_found(name: impl Into<String>) -> Self {
        Self::Failed(FailureReason::FileNotFound(name.into()))
    }

    pub fn executable_not_found(name: impl Into<String>) -> Self {
        Self::Failed(FailureReason::ExecutableNotFound(name.into()))
    }

    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::Failed(FailureReason::ToolNotFound(name.into()))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(FailureReason::Generic(message.into()))
    }

    pub fn exception(error: anyhow::Error) -> Self {
        Self::ExceptionCaught(CaughtError::new(error))
    }

    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            Self::Passed => ResultKind::Passed,
            Self::Failed(_) => ResultKind::Failed,
            Self::ExceptionCaught(_) => ResultKind::ExceptionCaught,
        }
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for PhaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "Passed."),
            Self::Failed(reason) => write!(f, "{}", reason),
            Self::ExceptionCaught(error) => write!(f, "Exception occurred: {}", error),
        }
    }
}

/// Why the search gate rejected a rule in a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum NotSearchableReason {
    /// The inclusion/exclusion filter rejected the rule
    Excluded,
    MaxDepthExceeded { depth: usize, max_depth: usize },
    /// The rule does not nest and something already applied in an ancestor
    NotNestable,
    /// The rule already applied in an ancestor and may not nest inside itself
    NotSelfNestable,
    Yielded { to: RuleId },
}

impl fmt::Display for NotSearchableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluded => write!(f, "Detector type was excluded."),
            Self::MaxDepthExceeded { depth, max_depth } => write!(
                f,
                "Max depth of {} exceeded by {}.",
                max_depth, depth
            ),
            Self::NotNestable => write!(f, "Not nestable and a detector already applied in parent directory."),
            Self::NotSelfNestable => write!(f, "Nestable but this detector already applied in a parent directory."),
            Self::Yielded { to } => write!(f, "Yielded to detector {}.", to),
        }
    }
}

/// Outcome of the search gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    Searchable,
    NotSearchable(NotSearchableReason),
}

impl SearchResult {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Searchable)
    }

    pub fn reason(&self) -> Option<&NotSearchableReason> {
        match self {
            Self::NotSearchable(reason) => Some(reason),
            Self::Searchable => None,
        }
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Searchable => write!(f, "Searchable."),
            Self::NotSearchable(reason) => write!(f, "{}", reason),
        }
    }
}
