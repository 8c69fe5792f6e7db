//! Scan configuration
//!
//! [`ScanConfig::default`] reads `BOMSCAN_*` environment variables and falls
//! back to built-in defaults; CLI flags are applied on top by the caller.
//!
//! # Environment Variables
//!
//! - `BOMSCAN_FORCE_NESTED`: search below already-applied rules (true|false) - default: false
//! - `BOMSCAN_MAX_DEPTH`: deepest directory level added to the tree - default: 10
//! - `BOMSCAN_INCLUDED_RULES`: comma separated rule ids or groups; empty means all
//! - `BOMSCAN_EXCLUDED_RULES`: comma separated rule ids or groups
//! - `BOMSCAN_EXCLUDED_DIRS`: comma separated directory patterns, replacing the defaults
//! - `BOMSCAN_OUTPUT_DIR`: extraction output base - default: user cache dir + "bomscan"
//! - `BOMSCAN_TOOLS_DIR`: where bundled tools are installed - default: user data dir + "bomscan/tools"
//! - `BOMSCAN_GRADLE_PATH`: Gradle executable to prefer over the wrapper and `PATH`
//! - `BOMSCAN_GRADLE_BUILD_COMMAND`: Gradle task and arguments - default: "dependencies"
//! - `BOMSCAN_GRADLE_INSPECTOR_PATH`: pre-provisioned inspector init script
//! - `BOMSCAN_LOG_LEVEL`: logging level - default: "info"

use crate::detectables::gradle::DEFAULT_BUILD_COMMAND;
use crate::detectables::GradleOptions;
use crate::evaluator::EvaluatorOptions;
use crate::rule::RuleFilter;
use crate::tree::{TreeConfig, DEFAULT_EXCLUDED_DIRECTORIES};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

const DEFAULT_MAX_DEPTH: usize = 10;
const MAX_ALLOWED_DEPTH: usize = 100;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Rule '{0}' is both included and excluded")]
    ConflictingRuleFilter(String),
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub force_nested: bool,
    pub max_depth: usize,
    pub included_rules: Vec<String>,
    pub excluded_rules: Vec<String>,
    pub excluded_directories: Vec<String>,
    pub output_dir: PathBuf,
    pub tools_dir: PathBuf,
    pub gradle_path: Option<PathBuf>,
    pub gradle_build_command: String,
    pub gradle_inspector_path: Option<PathBuf>,
    pub log_level: String,
}

fn env_list(key: &str) -> Option<Vec<String>> {
    env::var(key).ok().map(|value| split_list(&value))
}

/// Splits a comma separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_output_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("bomscan")
}

fn default_tools_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(env::temp_dir)
        .join("bomscan")
        .join("tools")
}

impl Default for ScanConfig {
    fn default() -> Self {
        let force_nested = env::var("BOMSCAN_FORCE_NESTED")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        let max_depth = env::var("BOMSCAN_MAX_DEPTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_DEPTH);

        let included_rules = env_list("BOMSCAN_INCLUDED_RULES").unwrap_or_default();
        let excluded_rules = env_list("BOMSCAN_EXCLUDED_RULES").unwrap_or_default();
        let excluded_directories = env_list("BOMSCAN_EXCLUDED_DIRS").unwrap_or_else(|| {
            DEFAULT_EXCLUDED_DIRECTORIES
                .iter()
                .map(|s| s.to_string())
                .collect()
        });

        let output_dir = env::var("BOMSCAN_OUTPUT_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(default_output_dir);

        let tools_dir = env::var("BOMSCAN_TOOLS_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(default_tools_dir);

        let gradle_path = env::var("BOMSCAN_GRADLE_PATH").ok().map(PathBuf::from);
        let gradle_build_command = env::var("BOMSCAN_GRADLE_BUILD_COMMAND")
            .unwrap_or_else(|_| DEFAULT_BUILD_COMMAND.to_string());
        let gradle_inspector_path = env::var("BOMSCAN_GRADLE_INSPECTOR_PATH")
            .ok()
            .map(PathBuf::from);

        let log_level = env::var("BOMSCAN_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            force_nested,
            max_depth,
            included_rules,
            excluded_rules,
            excluded_directories,
            output_dir,
            tools_dir,
            gradle_path,
            gradle_build_command,
            gradle_inspector_path,
            log_level,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth > MAX_ALLOWED_DEPTH {
            return Err(ConfigError::ValidationFailed(format!(
                "Max depth cannot exceed {}",
                MAX_ALLOWED_DEPTH
            )));
        }

        if let Some(rule) = self.included_rules.iter().find(|included| {
            self.excluded_rules
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(included))
        }) {
            return Err(ConfigError::ConflictingRuleFilter(rule.clone()));
        }

        if self.gradle_build_command.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Gradle build command cannot be empty".to_string(),
            ));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Output directory cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn rule_filter(&self) -> RuleFilter {
        RuleFilter::new(self.included_rules.clone(), self.excluded_rules.clone())
    }

    pub fn evaluator_options(&self) -> EvaluatorOptions {
        EvaluatorOptions {
            filter: Arc::new(self.rule_filter()),
            force_nested: self.force_nested,
        }
    }

    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            excluded_directories: self.excluded_directories.clone(),
        }
    }

    pub fn gradle_options(&self) -> GradleOptions {
        GradleOptions {
            gradle_path: self.gradle_path.clone(),
            build_command: self.gradle_build_command.clone(),
            inspector_path: self.gradle_inspector_path.clone(),
            tools_dir: self.tools_dir.clone(),
        }
    }
}

impl fmt::Display for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bomscan Configuration:")?;
        writeln!(f, "  Force Nested: {}", self.force_nested)?;
        writeln!(f, "  Max Depth: {}", self.max_depth)?;
        writeln!(f, "  Included Rules: {}", self.included_rules.join(", "))?;
        writeln!(f, "  Excluded Rules: {}", self.excluded_rules.join(", "))?;
        writeln!(f, "  Excluded Dirs: {}", self.excluded_directories.join(", "))?;
        writeln!(f, "  Output Dir: {}", self.output_dir.display())?;
        writeln!(f, "  Tools Dir: {}", self.tools_dir.display())?;
        if let Some(ref path) = self.gradle_path {
            writeln!(f, "  Gradle Path: {}", path.display())?;
        }
        writeln!(f, "  Gradle Build Command: {}", self.gradle_build_command)?;
        if let Some(ref path) = self.gradle_inspector_path {
            writeln!(f, "  Gradle Inspector: {}", path.display())?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
