//! Per-extraction output directories

use crate::evaluation::Evaluation;
use crate::plugin::ExtractionEnvironment;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Hands out a fresh directory under `<base>/extractions` for every
/// evaluation that reaches the extraction pass
#[derive(Debug, Clone)]
pub struct ExtractionWorkspaces {
    base: PathBuf,
}

impl ExtractionWorkspaces {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn extractions_dir(&self) -> PathBuf {
        self.base.join("extractions")
    }

    /// Creates `<base>/extractions/<rule-id>-<uuid>`
    pub fn create(&self, evaluation: &Evaluation) -> Result<ExtractionEnvironment> {
        let name = format!("{}-{}", evaluation.rule().id(), Uuid::new_v4());
        let directory = self.extractions_dir().join(name);
        fs::create_dir_all(&directory).with_context(|| {
            format!(
                "Failed to create extraction directory {}",
                directory.display()
            )
        })?;
        debug!(
            rule = %evaluation.rule().id(),
            directory = %directory.display(),
            "Created extraction workspace"
        );
        Ok(ExtractionEnvironment::new(directory))
    }
}
