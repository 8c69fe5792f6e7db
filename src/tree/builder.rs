use super::EvaluationTree;
use crate::error::TreeError;
use crate::fs::FileSystem;
use crate::rule::RuleSet;
use ignore::overrides::{Override, OverrideBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Directories never worth searching for build metadata
pub const DEFAULT_EXCLUDED_DIRECTORIES: &[&str] = &[
    ".git",
    ".gradle",
    ".idea",
    ".svn",
    ".hg",
    "node_modules",
    "__pycache__",
    "target",
];

#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Directories deeper than this below the root are not added
    pub max_depth: usize,
    /// Gitignore-style patterns; a plain name matches at any level
    pub excluded_directories: Vec<String>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            excluded_directories: DEFAULT_EXCLUDED_DIRECTORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Builds the evaluation tree for a source directory
pub struct EvaluationTreeBuilder {
    fs: Arc<dyn FileSystem>,
    rule_set: Arc<RuleSet>,
    config: TreeConfig,
}

impl EvaluationTreeBuilder {
    pub fn new(fs: Arc<dyn FileSystem>, rule_set: Arc<RuleSet>) -> Self {
        Self {
            fs,
            rule_set,
            config: TreeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TreeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(&self, root: &Path) -> Result<EvaluationTree, TreeError> {
        if !self.fs.exists(root) {
            return Err(TreeError::RootNotFound(root.to_path_buf()));
        }
        if !self.fs.is_dir(root) {
            return Err(TreeError::NotADirectory(root.to_path_buf()));
        }

        let start = Instant::now();
        let overrides = self.exclusions(root)?;
        let tree = self.build_node(root, 0, &overrides)?;

        info!(
            root = %root.display(),
            directories = tree.iter().count(),
            max_depth = self.config.max_depth,
            elapsed_ms = start.elapsed().as_millis(),
            "Evaluation tree built"
        );

        Ok(tree)
    }

    fn exclusions(&self, root: &Path) -> Result<Override, TreeError> {
        let mut builder = OverrideBuilder::new(root);
        for pattern in &self.config.excluded_directories {
            let glob = format!("!{}/", pattern.trim_end_matches('/'));
            builder
                .add(&glob)
                .map_err(|source| TreeError::InvalidExclusion {
                    pattern: pattern.clone(),
                    source,
                })?;
        }
        builder.build().map_err(|source| TreeError::InvalidExclusion {
            pattern: self.config.excluded_directories.join(","),
            source,
        })
    }

    fn build_node(
        &self,
        directory: &Path,
        depth: usize,
        overrides: &Override,
    ) -> Result<EvaluationTree, TreeError> {
        let mut children = Vec::new();

        if depth < self.config.max_depth {
            let entries = match self.fs.read_dir(directory) {
                Ok(entries) => entries,
                Err(err) if depth == 0 => {
                    return Err(TreeError::ReadFailed {
                        path: directory.to_path_buf(),
                        message: format!("{:#}", err),
                    })
                }
                Err(err) => {
                    warn!(
                        directory = %directory.display(),
                        error = %format!("{:#}", err),
                        "Failed to read directory, skipping its subdirectories"
                    );
                    Vec::new()
                }
            };

            let mut subdirectories: Vec<PathBuf> = entries
                .into_iter()
                .filter(|entry| entry.is_dir())
                .map(|entry| entry.path)
                .filter(|path| {
                    let excluded = overrides.matched(path, true).is_ignore();
                    if excluded {
                        debug!(directory = %path.display(), "Skipping excluded directory");
                    }
                    !excluded
                })
                .collect();
            subdirectories.sort();

            for subdirectory in subdirectories {
                children.push(self.build_node(&subdirectory, depth + 1, overrides)?);
            }
        }

        Ok(EvaluationTree::new(
            directory,
            depth,
            self.rule_set.clone(),
            children,
        ))
    }
}
