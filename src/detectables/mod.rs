//! Built-in detectors and the default rule set

pub mod executable;
pub mod go_dep;
pub mod go_mod;
pub mod gradle;

pub use executable::{
    ExecutableOutput, ExecutableResolver, ExecutableRunner, SystemExecutableResolver,
    SystemExecutableRunner,
};
pub use go_dep::GoDepLockDetectable;
pub use go_mod::GoModDetectable;
pub use gradle::{
    GradleInspectorDetectable, GradleInspectorResolver, GradleOptions, GradleParseDetectable,
    GradleResolver,
};

use crate::fs::{FileFinder, FileSystem};
use crate::plugin::Plugin;
use crate::rule::{Rule, RuleSet, RuleSetError};
use std::path::Path;
use std::sync::Arc;

pub const GO_MOD: &str = "go-mod";
pub const GO_DEP_LOCK: &str = "go-dep-lock";
pub const GRADLE_INSPECTOR: &str = "gradle-inspector";
pub const GRADLE_PARSE: &str = "gradle-parse";

/// Shared collaborators handed to every built-in plugin
pub struct Detectables {
    finder: FileFinder,
    executables: Arc<dyn ExecutableResolver>,
    runner: Arc<dyn ExecutableRunner>,
    gradle: GradleOptions,
}

impl Detectables {
    pub fn new(fs: Arc<dyn FileSystem>, gradle: GradleOptions) -> Self {
        Self {
            finder: FileFinder::new(fs),
            executables: Arc::new(SystemExecutableResolver::new()),
            runner: Arc::new(SystemExecutableRunner),
            gradle,
        }
    }

    pub fn with_executables(mut self, executables: Arc<dyn ExecutableResolver>) -> Self {
        self.executables = executables;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn ExecutableRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Go and Gradle rules with their yield and fallback relationships
    pub fn rule_set(&self) -> Result<RuleSet, RuleSetError> {
        RuleSet::builder()
            .add_rule(self.go_mod_rule())
            .add_rule(self.go_dep_lock_rule())
            .add_rule(self.gradle_inspector_rule())
            .add_rule(self.gradle_parse_rule())
            .yield_to(GO_DEP_LOCK, GO_MOD)
            .fallback(GRADLE_INSPECTOR, GRADLE_PARSE)
            .build()
    }

    fn go_mod_rule(&self) -> Rule {
        let finder = self.finder.clone();
        Rule::new(GO_MOD, "Go Mod", move |directory: &Path| {
            Box::new(GoModDetectable::new(directory, finder.clone())) as Box<dyn Plugin>
        })
        .with_group("Go")
    }

    fn go_dep_lock_rule(&self) -> Rule {
        let finder = self.finder.clone();
        Rule::new(GO_DEP_LOCK, "Go Lock", move |directory: &Path| {
            Box::new(GoDepLockDetectable::new(directory, finder.clone())) as Box<dyn Plugin>
        })
        .with_group("Go")
    }

    fn gradle_inspector_rule(&self) -> Rule {
        let finder = self.finder.clone();
        let gradle_resolver = Arc::new(GradleResolver::new(
            self.finder.clone(),
            self.executables.clone(),
            self.gradle.gradle_path.clone(),
        ));
        let inspector_resolver = Arc::new(GradleInspectorResolver::new(
            self.finder.clone(),
            self.gradle.inspector_path.clone(),
            self.gradle.tools_dir.clone(),
        ));
        let runner = self.runner.clone();
        let build_command = self.gradle.build_command.clone();

        Rule::new(GRADLE_INSPECTOR, "Gradle Inspector", move |directory: &Path| {
            Box::new(GradleInspectorDetectable::new(
                directory,
                finder.clone(),
                gradle_resolver.clone(),
                inspector_resolver.clone(),
                runner.clone(),
                build_command.clone(),
            )) as Box<dyn Plugin>
        })
        .with_group("Gradle")
    }

    fn gradle_parse_rule(&self) -> Rule {
        let finder = self.finder.clone();
        Rule::new(GRADLE_PARSE, "Gradle Parse", move |directory: &Path| {
            Box::new(GradleParseDetectable::new(directory, finder.clone())) as Box<dyn Plugin>
        })
        .with_group("Gradle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::rule::RuleId;

    #[test]
    fn test_default_rule_set() {
        let fs = Arc::new(MockFileSystem::new());
        let set = Detectables::new(fs, GradleOptions::default()).rule_set().unwrap();

        let ids: Vec<_> = set.ordered_rules().iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec![GO_MOD, GO_DEP_LOCK, GRADLE_INSPECTOR, GRADLE_PARSE]);
        assert_eq!(set.yields_to(&RuleId::new(GO_DEP_LOCK)), &[RuleId::new(GO_MOD)]);
        assert_eq!(
            set.fallback_from(&RuleId::new(GRADLE_PARSE)),
            Some(&RuleId::new(GRADLE_INSPECTOR))
        );
        assert_eq!(set.get(&RuleId::new(GRADLE_PARSE)).unwrap().group(), "Gradle");
    }
}
