//! Go dep lock files (`Gopkg.lock`)

use crate::fs::FileFinder;
use crate::plugin::{Dependency, Extraction, ExtractionEnvironment, Plugin};
use crate::result::PhaseResult;
use crate::{DetectableError, Forge};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const GOPKG_LOCK_FILENAME: &str = "Gopkg.lock";

#[derive(Debug, Default, Deserialize)]
pub struct GopkgLock {
    #[serde(default)]
    pub projects: Vec<LockedProject>,
}

#[derive(Debug, Deserialize)]
pub struct LockedProject {
    pub name: String,
    #[serde(default)]
    pub packages: Vec<String>,
    pub version: Option<String>,
    pub branch: Option<String>,
    pub revision: Option<String>,
}

impl LockedProject {
    /// Tagged version when present, otherwise the pinned revision
    pub fn resolved_version(&self) -> Option<String> {
        self.version
            .clone()
            .or_else(|| self.revision.clone())
            .filter(|v| !v.trim().is_empty())
    }
}

pub fn parse_gopkg_lock(content: &str) -> Result<GopkgLock> {
    toml::from_str(content).context("Failed to parse Gopkg.lock")
}

/// One dependency per imported package; `.` is the project root itself
pub fn lock_dependencies(lock: &GopkgLock) -> Vec<Dependency> {
    let mut dependencies = BTreeSet::new();
    for project in &lock.projects {
        let version = project.resolved_version();
        if project.packages.is_empty() {
            dependencies.insert(Dependency::new(Forge::Golang, project.name.clone(), version.clone()));
        }
        for package in &project.packages {
            let name = match package.trim() {
                "." | "" => project.name.clone(),
                sub => format!("{}/{}", project.name, sub.trim_start_matches("./")),
            };
            dependencies.insert(Dependency::new(Forge::Golang, name, version.clone()));
        }
    }
    dependencies.into_iter().collect()
}

pub struct GoDepLockDetectable {
    directory: PathBuf,
    finder: FileFinder,
    lock_file: Option<PathBuf>,
}

impl GoDepLockDetectable {
    pub fn new(directory: impl Into<PathBuf>, finder: FileFinder) -> Self {
        Self {
            directory: directory.into(),
            finder,
            lock_file: None,
        }
    }
}

impl Plugin for GoDepLockDetectable {
    fn applicable(&mut self) -> PhaseResult {
        self.lock_file = self.finder.find_file(&self.directory, GOPKG_LOCK_FILENAME);
        match self.lock_file {
            Some(_) => PhaseResult::Passed,
            None => PhaseResult::file_not_found(GOPKG_LOCK_FILENAME),
        }
    }

    fn extractable(&mut self) -> Result<PhaseResult, DetectableError> {
        Ok(PhaseResult::Passed)
    }

    fn extract(&mut self, _environment: &ExtractionEnvironment) -> Result<Extraction> {
        let path = self
            .lock_file
            .as_ref()
            .context("Gopkg.lock was not located during the applicable check")?;
        let content = self
            .finder
            .file_system()
            .read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let lock = parse_gopkg_lock(&content)?;

        Ok(Extraction::success(lock_dependencies(&lock)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use std::sync::Arc;

    const LOCK: &str = r#"
[[projects]]
  name = "github.com/pkg/errors"
  packages = ["."]
  revision = "645ef00459ed84a119197bfb8d8205042c6df63d"
  version = "v0.8.0"

[[projects]]
  branch = "master"
  name = "golang.org/x/net"
  packages = ["context", "http2"]
  revision = "1c05540f6879653db88113bc4a2b70aec4bd491f"

[solve-meta]
  analyzer-name = "dep"
  inputs-digest = "abc"
"#;

    #[test]
    fn test_parse_lock() {
        let lock = parse_gopkg_lock(LOCK).unwrap();
        assert_eq!(lock.projects.len(), 2);
        assert_eq!(lock.projects[1].branch.as_deref(), Some("master"));

        let deps: Vec<_> = lock_dependencies(&lock)
            .into_iter()
            .map(|d| (d.name, d.version.unwrap_or_default()))
            .collect();
        assert_eq!(
            deps,
            vec![
                ("github.com/pkg/errors".to_string(), "v0.8.0".to_string()),
                (
                    "golang.org/x/net/context".to_string(),
                    "1c05540f6879653db88113bc4a2b70aec4bd491f".to_string()
                ),
                (
                    "golang.org/x/net/http2".to_string(),
                    "1c05540f6879653db88113bc4a2b70aec4bd491f".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_invalid_lock_is_an_error() {
        let err = parse_gopkg_lock("[[projects]\nname =").unwrap_err();
        assert!(err.to_string().contains("Gopkg.lock"));
    }

    #[test]
    fn test_lock_only_directory_extracts() {
        let fs = Arc::new(MockFileSystem::with_root(PathBuf::from("/repo")));
        fs.add_file("Gopkg.lock", LOCK);
        let mut plugin = GoDepLockDetectable::new("/repo", FileFinder::new(fs));

        assert!(plugin.applicable().passed());
        assert!(plugin.extractable().unwrap().passed());
        let extraction = plugin.extract(&ExtractionEnvironment::new("/out")).unwrap();
        assert!(extraction.is_success());
        assert_eq!(extraction.dependencies.len(), 3);
    }

    #[test]
    fn test_extract_reports_parse_failure() {
        let fs = Arc::new(MockFileSystem::with_root(PathBuf::from("/repo")));
        fs.add_file("Gopkg.lock", "this is = = not toml");
        let mut plugin = GoDepLockDetectable::new("/repo", FileFinder::new(fs));

        assert!(plugin.applicable().passed());
        assert!(plugin.extract(&ExtractionEnvironment::new("/out")).is_err());
    }
}
