//! Detector rules
//!
//! A [`Rule`] describes one detectable convention (a package manager or build
//! tool) and knows how to bind a [`Plugin`] to a directory. Rules are built
//! once at startup and shared read-only through [`RuleSet`]s.

mod filter;
mod set;

pub use filter::RuleFilter;
pub use set::{RuleSet, RuleSetBuilder, RuleSetError};

use crate::plugin::Plugin;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Stable identifier of a rule, e.g. `go-mod`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

pub type PluginFactory = Arc<dyn Fn(&Path) -> Box<dyn Plugin> + Send + Sync>;

pub struct Rule {
    id: RuleId,
    descriptive_name: String,
    group: String,
    nestable: bool,
    self_nestable: bool,
    max_depth: Option<usize>,
    factory: PluginFactory,
}

impl Rule {
    /// Creates a nestable, non-self-nestable rule with no depth limit
    pub fn new<F>(id: impl Into<RuleId>, descriptive_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Path) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        let descriptive_name = descriptive_name.into();
        Self {
            id: id.into(),
            group: descriptive_name.clone(),
            descriptive_name,
            nestable: true,
            self_nestable: false,
            max_depth: None,
            factory: Arc::new(factory),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn nestable(mut self, nestable: bool) -> Self {
        self.nestable = nestable;
        self
    }

    pub fn self_nestable(mut self, self_nestable: bool) -> Self {
        self.self_nestable = self_nestable;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn id(&self) -> &RuleId {
        &self.id
    }

    pub fn descriptive_name(&self) -> &str {
        &self.descriptive_name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn is_nestable(&self) -> bool {
        self.nestable
    }

    pub fn is_self_nestable(&self) -> bool {
        self.self_nestable
    }

    pub fn max_depth_limit(&self) -> Option<usize> {
        self.max_depth
    }

    /// Binds a fresh plugin instance to `directory`
    pub fn create_plugin(&self, directory: &Path) -> Box<dyn Plugin> {
        (self.factory)(directory)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("descriptive_name", &self.descriptive_name)
            .field("group", &self.group)
            .field("nestable", &self.nestable)
            .field("self_nestable", &self.self_nestable)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
