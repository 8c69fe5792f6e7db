//! Locating and running external build tools

use anyhow::{Context, Result};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Finds an executable by name
pub trait ExecutableResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<PathBuf>;
}

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutableOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs an executable to completion in a working directory
pub trait ExecutableRunner: Send + Sync {
    fn run(&self, directory: &Path, executable: &Path, args: &[String]) -> Result<ExecutableOutput>;
}

/// Looks executables up on `PATH`, or on an explicit search path when given
#[derive(Debug, Clone)]
pub struct SystemExecutableResolver {
    search_path: Option<OsString>,
}

impl SystemExecutableResolver {
    pub fn new() -> Self {
        Self { search_path: None }
    }

    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl Default for SystemExecutableResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutableResolver for SystemExecutableResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(search_path) => {
                let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(name, Some(search_path), cwd)
            }
            None => which::which(name),
        };
        match found {
            Ok(path) => {
                debug!(name, path = %path.display(), "Resolved executable");
                Some(path)
            }
            Err(err) => {
                debug!(name, error = %err, "Executable not found");
                None
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutableRunner;

impl ExecutableRunner for SystemExecutableRunner {
    fn run(&self, directory: &Path, executable: &Path, args: &[String]) -> Result<ExecutableOutput> {
        debug!(
            executable = %executable.display(),
            directory = %directory.display(),
            args = %args.join(" "),
            "Running executable"
        );
        let output = Command::new(executable)
            .args(args)
            .current_dir(directory)
            .output()
            .with_context(|| format!("Failed to run {}", executable.display()))?;

        Ok(ExecutableOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_resolves_first_executable_on_path() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(first.path().join("gradle"), "not executable").unwrap();
        let expected = write_script(second.path(), "gradle", "#!/bin/sh\n");

        let search_path = env::join_paths([first.path(), second.path()]).unwrap();
        let resolver = SystemExecutableResolver::with_search_path(search_path);

        assert_eq!(resolver.resolve("gradle"), Some(expected));
        assert_eq!(resolver.resolve("mvn"), None);
    }

    #[test]
    fn test_directory_with_executable_name_is_skipped() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::create_dir(first.path().join("go")).unwrap();
        let expected = write_script(second.path(), "go", "#!/bin/sh\n");

        let search_path = env::join_paths([first.path(), second.path()]).unwrap();
        let resolver = SystemExecutableResolver::with_search_path(search_path);

        assert_eq!(resolver.resolve("go"), Some(expected));
    }

    #[test]
    fn test_runner_captures_output() {
        let dir = TempDir::new().unwrap();
        let script = write_script(dir.path(), "tool", "#!/bin/sh\necho \"args: $@\"\necho oops >&2\nexit 3\n");

        let output = SystemExecutableRunner
            .run(dir.path(), &script, &["a".to_string(), "b".to_string()])
            .unwrap();

        assert_eq!(output.status, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "args: a b");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[test]
    fn test_runner_missing_executable() {
        let dir = TempDir::new().unwrap();
        let err = SystemExecutableRunner
            .run(dir.path(), &dir.path().join("missing"), &[])
            .unwrap_err();
        assert!(err.to_string().contains("Failed to run"));
    }
}
