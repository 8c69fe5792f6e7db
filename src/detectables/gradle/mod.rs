//! Gradle projects
//!
//! `gradle-inspector` runs the project's own Gradle with an init script and
//! reads the resolved dependency tree from its output. When no Gradle can be
//! found, `gradle-parse` falls back to reading declarations straight out of
//! the build file.

mod parse;
mod report;

pub use parse::{parse_build_file, GradleParseDetectable};
pub use report::{parse_report, GradleReport};

use super::executable::{ExecutableResolver, ExecutableRunner};
use crate::fs::FileFinder;
use crate::plugin::{Extraction, ExtractionEnvironment, Plugin};
use crate::result::PhaseResult;
use crate::DetectableError;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

pub const BUILD_GRADLE_FILENAMES: &[&str] = &["build.gradle", "build.gradle.kts"];
pub const DEFAULT_BUILD_COMMAND: &str = "dependencies";
pub const INSPECTOR_SCRIPT_NAME: &str = "init-bomscan-inspector.gradle";
pub const REPORT_FILENAME: &str = "gradle-dependencies.txt";

#[cfg(windows)]
const WRAPPER_NAME: &str = "gradlew.bat";
#[cfg(not(windows))]
const WRAPPER_NAME: &str = "gradlew";

const INSPECTOR_SCRIPT: &str = r#"// Generated by bomscan
gradle.projectsEvaluated {
    def root = gradle.rootProject
    println "bomscan-project: ${root.name} ${root.version}"
}
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradleOptions {
    /// Explicit Gradle executable, tried before the wrapper and `PATH`
    pub gradle_path: Option<PathBuf>,
    /// Task and arguments passed to Gradle, split on whitespace
    pub build_command: String,
    /// Pre-provisioned inspector init script; must exist when set
    pub inspector_path: Option<PathBuf>,
    /// Where the bundled inspector script is written when none is configured
    pub tools_dir: PathBuf,
}

impl Default for GradleOptions {
    fn default() -> Self {
        Self {
            gradle_path: None,
            build_command: DEFAULT_BUILD_COMMAND.to_string(),
            inspector_path: None,
            tools_dir: std::env::temp_dir().join("bomscan").join("tools"),
        }
    }
}

/// Finds the Gradle executable for a project directory
pub struct GradleResolver {
    finder: FileFinder,
    executables: Arc<dyn ExecutableResolver>,
    configured: Option<PathBuf>,
}

impl GradleResolver {
    pub fn new(
        finder: FileFinder,
        executables: Arc<dyn ExecutableResolver>,
        configured: Option<PathBuf>,
    ) -> Self {
        Self {
            finder,
            executables,
            configured,
        }
    }

    /// Configured path, then the wrapper in `directory`, then `gradle` on `PATH`
    pub fn resolve(&self, directory: &Path) -> Option<PathBuf> {
        if let Some(configured) = &self.configured {
            if self.finder.file_system().is_file(configured) {
                return Some(configured.clone());
            }
            debug!(path = %configured.display(), "Configured Gradle path does not exist");
        }
        self.finder
            .find_file(directory, WRAPPER_NAME)
            .or_else(|| self.executables.resolve("gradle"))
    }
}

/// Locates the inspector init script, installing the bundled one once
pub struct GradleInspectorResolver {
    finder: FileFinder,
    configured: Option<PathBuf>,
    tools_dir: PathBuf,
    resolved: Mutex<Option<Option<PathBuf>>>,
}

impl GradleInspectorResolver {
    pub fn new(
        finder: FileFinder,
        configured: Option<PathBuf>,
        tools_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            finder,
            configured,
            tools_dir: tools_dir.into(),
            resolved: Mutex::new(None),
        }
    }

    /// `Ok(None)` when a configured script is missing. The bundled script is
    /// written to disk, since Gradle has to read it from there.
    pub fn resolve(&self) -> Result<Option<PathBuf>, DetectableError> {
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = resolved.as_ref() {
            return Ok(cached.clone());
        }

        let script = match &self.configured {
            Some(path) if self.finder.file_system().is_file(path) => Some(path.clone()),
            Some(path) => {
                info!(path = %path.display(), "Configured Gradle inspector does not exist");
                None
            }
            None => Some(self.install()?),
        };
        *resolved = Some(script.clone());
        Ok(script)
    }

    fn install(&self) -> Result<PathBuf, DetectableError> {
        let directory = self.tools_dir.join("gradle-inspector");
        let io_error = |source: std::io::Error| DetectableError::Io {
            tool: "gradle-inspector".to_string(),
            source,
        };
        fs::create_dir_all(&directory).map_err(io_error)?;
        let script = directory.join(INSPECTOR_SCRIPT_NAME);
        fs::write(&script, INSPECTOR_SCRIPT).map_err(io_error)?;
        debug!(path = %script.display(), "Installed Gradle inspector");
        Ok(script)
    }
}

pub struct GradleInspectorDetectable {
    directory: PathBuf,
    finder: FileFinder,
    gradle_resolver: Arc<GradleResolver>,
    inspector_resolver: Arc<GradleInspectorResolver>,
    runner: Arc<dyn ExecutableRunner>,
    build_command: String,
    build_file: Option<PathBuf>,
    gradle: Option<PathBuf>,
    inspector: Option<PathBuf>,
}

impl GradleInspectorDetectable {
    pub fn new(
        directory: impl Into<PathBuf>,
        finder: FileFinder,
        gradle_resolver: Arc<GradleResolver>,
        inspector_resolver: Arc<GradleInspectorResolver>,
        runner: Arc<dyn ExecutableRunner>,
        build_command: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            finder,
            gradle_resolver,
            inspector_resolver,
            runner,
            build_command: build_command.into(),
            build_file: None,
            gradle: None,
            inspector: None,
        }
    }
}

impl Plugin for GradleInspectorDetectable {
    fn applicable(&mut self) -> PhaseResult {
        self.build_file = self.finder.find_first(&self.directory, BUILD_GRADLE_FILENAMES);
        match self.build_file {
            Some(_) => PhaseResult::Passed,
            None => PhaseResult::file_not_found(BUILD_GRADLE_FILENAMES[0]),
        }
    }

    fn extractable(&mut self) -> Result<PhaseResult, DetectableError> {
        self.gradle = self.gradle_resolver.resolve(&self.directory);
        if self.gradle.is_none() {
            return Ok(PhaseResult::executable_not_found("gradle"));
        }

        self.inspector = self.inspector_resolver.resolve()?;
        if self.inspector.is_none() {
            return Ok(PhaseResult::tool_not_found("gradle-inspector"));
        }

        Ok(PhaseResult::Passed)
    }

    fn extract(&mut self, environment: &ExtractionEnvironment) -> Result<Extraction> {
        let gradle = self
            .gradle
            .as_ref()
            .context("Gradle was not resolved during the extractable check")?;
        let inspector = self
            .inspector
            .as_ref()
            .context("Gradle inspector was not resolved during the extractable check")?;

        let mut args: Vec<String> = self
            .build_command
            .split_whitespace()
            .map(str::to_string)
            .collect();
        args.push("--init-script".to_string());
        args.push(inspector.display().to_string());

        let output = self.runner.run(&self.directory, gradle, &args)?;

        let output_directory = environment.output_directory();
        fs::create_dir_all(output_directory)
            .with_context(|| format!("Failed to create {}", output_directory.display()))?;
        let report_path = output_directory.join(REPORT_FILENAME);
        fs::write(&report_path, &output.stdout)
            .with_context(|| format!("Failed to write {}", report_path.display()))?;

        if !output.success() {
            let detail = output
                .stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no error output");
            let status = output
                .status
                .map_or_else(|| "a signal".to_string(), |code| format!("status {}", code));
            return Ok(Extraction::failure(format!(
                "Gradle exited with {}: {}",
                status, detail
            )));
        }

        let report = parse_report(&output.stdout);
        let extraction = Extraction::success(report.dependencies);
        Ok(match report.project_name {
            Some(name) => extraction.with_project(name, report.project_version),
            None => extraction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectables::executable::ExecutableOutput;
    use crate::fs::MockFileSystem;
    use crate::result::{FailureReason, ResultKind};
    use tempfile::TempDir;

    struct NoExecutables;

    impl ExecutableResolver for NoExecutables {
        fn resolve(&self, _name: &str) -> Option<PathBuf> {
            None
        }
    }

    struct OnPath(&'static str);

    impl ExecutableResolver for OnPath {
        fn resolve(&self, name: &str) -> Option<PathBuf> {
            (name == "gradle").then(|| PathBuf::from(self.0))
        }
    }

    struct CannedRunner {
        output: ExecutableOutput,
        calls: Mutex<Vec<(PathBuf, PathBuf, Vec<String>)>>,
    }

    impl CannedRunner {
        fn new(status: i32, stdout: &str, stderr: &str) -> Self {
            Self {
                output: ExecutableOutput {
                    status: Some(status),
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                },
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ExecutableRunner for CannedRunner {
        fn run(&self, directory: &Path, executable: &Path, args: &[String]) -> Result<ExecutableOutput> {
            self.calls.lock().unwrap().push((
                directory.to_path_buf(),
                executable.to_path_buf(),
                args.to_vec(),
            ));
            Ok(self.output.clone())
        }
    }

    fn project() -> Arc<MockFileSystem> {
        let fs = Arc::new(MockFileSystem::with_root(PathBuf::from("/repo")));
        fs.add_file("build.gradle", "plugins { id 'java' }");
        fs
    }

    fn detectable(
        fs: Arc<MockFileSystem>,
        executables: Arc<dyn ExecutableResolver>,
        tools: &Path,
        runner: Arc<dyn ExecutableRunner>,
    ) -> GradleInspectorDetectable {
        let finder = FileFinder::new(fs);
        GradleInspectorDetectable::new(
            "/repo",
            finder.clone(),
            Arc::new(GradleResolver::new(finder.clone(), executables, None)),
            Arc::new(GradleInspectorResolver::new(finder, None, tools)),
            runner,
            DEFAULT_BUILD_COMMAND,
        )
    }

    #[test]
    fn test_resolver_prefers_configured_then_wrapper() {
        let fs = project();
        fs.add_file("/opt/gradle/bin/gradle", "");
        fs.add_file("gradlew", "#!/bin/sh");
        let finder = FileFinder::new(fs);

        let configured = GradleResolver::new(
            finder.clone(),
            Arc::new(OnPath("/usr/bin/gradle")),
            Some(PathBuf::from("/opt/gradle/bin/gradle")),
        );
        assert_eq!(
            configured.resolve(Path::new("/repo")),
            Some(PathBuf::from("/opt/gradle/bin/gradle"))
        );

        let wrapper = GradleResolver::new(finder.clone(), Arc::new(OnPath("/usr/bin/gradle")), None);
        assert_eq!(
            wrapper.resolve(Path::new("/repo")),
            Some(PathBuf::from("/repo").join(WRAPPER_NAME))
        );

        let system = GradleResolver::new(finder, Arc::new(OnPath("/usr/bin/gradle")), None);
        assert_eq!(
            system.resolve(Path::new("/elsewhere")),
            Some(PathBuf::from("/usr/bin/gradle"))
        );
    }

    #[test]
    fn test_missing_gradle_is_executable_not_found() {
        let tools = TempDir::new().unwrap();
        let mut plugin = detectable(
            project(),
            Arc::new(NoExecutables),
            tools.path(),
            Arc::new(CannedRunner::new(0, "", "")),
        );

        assert!(plugin.applicable().passed());
        let result = plugin.extractable().unwrap();
        assert_eq!(
            result.failure_reason(),
            Some(&FailureReason::ExecutableNotFound("gradle".to_string()))
        );
    }

    #[test]
    fn test_missing_configured_inspector_is_tool_not_found() {
        let finder = FileFinder::new(project());
        let resolver = GradleInspectorResolver::new(
            finder.clone(),
            Some(PathBuf::from("/opt/inspector/missing.gradle")),
            "/tools",
        );
        assert_eq!(resolver.resolve().unwrap(), None);

        let mut plugin = GradleInspectorDetectable::new(
            "/repo",
            finder.clone(),
            Arc::new(GradleResolver::new(finder, Arc::new(OnPath("/usr/bin/gradle")), None)),
            Arc::new(resolver),
            Arc::new(CannedRunner::new(0, "", "")),
            DEFAULT_BUILD_COMMAND,
        );
        assert!(plugin.applicable().passed());
        assert_eq!(
            plugin.extractable().unwrap().failure_reason(),
            Some(&FailureReason::ToolNotFound("gradle-inspector".to_string()))
        );
    }

    #[test]
    fn test_configured_inspector_is_used_when_present() {
        let fs = project();
        fs.add_file("/opt/inspector/init.gradle", "// provisioned");
        let resolver = GradleInspectorResolver::new(
            FileFinder::new(fs),
            Some(PathBuf::from("/opt/inspector/init.gradle")),
            "/tools",
        );

        assert_eq!(
            resolver.resolve().unwrap(),
            Some(PathBuf::from("/opt/inspector/init.gradle"))
        );
    }

    #[test]
    fn test_inspector_installed_once() {
        let tools = TempDir::new().unwrap();
        let resolver = GradleInspectorResolver::new(FileFinder::new(project()), None, tools.path());

        let first = resolver.resolve().unwrap().unwrap();
        assert!(first.is_file());
        assert!(fs::read_to_string(&first).unwrap().contains(report::PROJECT_MARKER));

        let second = resolver.resolve().unwrap();
        assert_eq!(second, Some(first));
        assert_eq!(fs::read_dir(tools.path().join("gradle-inspector")).unwrap().count(), 1);
    }

    #[test]
    fn test_extract_runs_gradle_and_parses_report() {
        let tools = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let stdout = "bomscan-project: demo 2.0\n+--- junit:junit:4.13.2\n";
        let runner = Arc::new(CannedRunner::new(0, stdout, ""));
        let mut plugin = detectable(
            project(),
            Arc::new(OnPath("/usr/bin/gradle")),
            tools.path(),
            runner.clone(),
        );

        assert!(plugin.applicable().passed());
        assert!(plugin.extractable().unwrap().passed());
        let extraction = plugin
            .extract(&ExtractionEnvironment::new(out.path()))
            .unwrap();

        assert!(extraction.is_success());
        assert_eq!(extraction.project_name.as_deref(), Some("demo"));
        assert_eq!(extraction.project_version.as_deref(), Some("2.0"));
        assert_eq!(extraction.dependencies.len(), 1);
        assert_eq!(
            fs::read_to_string(out.path().join(REPORT_FILENAME)).unwrap(),
            stdout
        );

        let calls = runner.calls.lock().unwrap();
        let (directory, executable, args) = &calls[0];
        assert_eq!(directory, Path::new("/repo"));
        assert_eq!(executable, Path::new("/usr/bin/gradle"));
        assert_eq!(args[0], "dependencies");
        assert_eq!(args[1], "--init-script");
        assert!(args[2].ends_with(INSPECTOR_SCRIPT_NAME));
    }

    #[test]
    fn test_failed_build_is_failed_extraction() {
        let tools = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let mut plugin = detectable(
            project(),
            Arc::new(OnPath("/usr/bin/gradle")),
            tools.path(),
            Arc::new(CannedRunner::new(1, "", "FAILURE: Build failed\n\n")),
        );

        plugin.applicable();
        plugin.extractable().unwrap();
        let extraction = plugin
            .extract(&ExtractionEnvironment::new(out.path()))
            .unwrap();

        assert!(!extraction.is_success());
        assert_eq!(extraction.as_phase_result().kind(), ResultKind::Failed);
        assert_eq!(
            extraction.description.as_deref(),
            Some("Gradle exited with status 1: FAILURE: Build failed")
        );
    }
}
