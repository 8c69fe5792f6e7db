//! bomscan - detector evaluation engine for software composition analysis
//!
//! Given a source directory, bomscan decides which detectors (rules) apply in
//! which directories, checks that each applicable detector has its tooling,
//! and runs the extractions that passed every gate.
//!
//! # Core Concepts
//!
//! - **Rule**: a detector definition with nesting behaviour and a plugin factory
//! - **Rule set**: all rules plus yield and fallback relationships, in evaluation order
//! - **Evaluation tree**: one node per directory, one [`Evaluation`] per rule per node
//! - **Evaluator**: three depth-first passes (search + applicable, extractable,
//!   extraction) over the tree
//!
//! # Example Usage
//!
//! ```no_run
//! use bomscan::detectables::Detectables;
//! use bomscan::fs::RealFileSystem;
//! use bomscan::{ScanConfig, ScanRunner};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let config = ScanConfig::default();
//! let fs = Arc::new(RealFileSystem::new());
//! let rule_set = Detectables::new(fs.clone(), config.gradle_options())
//!     .rule_set()
//!     .expect("built-in rules are consistent");
//!
//! let report = ScanRunner::new(fs, Arc::new(rule_set), config)
//!     .run(Path::new("."))
//!     .expect("source directory exists");
//! println!("{}", report.summary);
//! ```

mod id_enum_macro;

pub mod cli;
pub mod config;
pub mod detectables;
pub mod error;
pub mod evaluation;
pub mod evaluator;
pub mod forge;
pub mod fs;
pub mod listener;
pub mod plugin;
pub mod report;
pub mod result;
pub mod rule;
pub mod scan;
pub mod search;
pub mod tree;
pub mod util;
pub mod workspace;

pub use config::{ConfigError, ScanConfig};
pub use error::{DetectableError, TreeError};
pub use evaluation::Evaluation;
pub use evaluator::{Evaluator, EvaluatorOptions, WorkspaceProvider};
pub use forge::Forge;
pub use listener::{CompositeListener, EvaluatorListener, LoggingListener, NoOpListener, ProgressListener};
pub use plugin::{Dependency, Extraction, ExtractionEnvironment, Plugin};
pub use report::ScanSummary;
pub use result::{CaughtError, FailureReason, NotSearchableReason, PhaseResult, SearchResult};
pub use rule::{Rule, RuleFilter, RuleId, RuleSet, RuleSetError};
pub use scan::{ScanReport, ScanRunner};
pub use search::SearchContext;
pub use tree::{EvaluationTree, EvaluationTreeBuilder, TreeConfig};
pub use util::{init_from_env, init_logging, LoggingConfig};
pub use workspace::ExtractionWorkspaces;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
