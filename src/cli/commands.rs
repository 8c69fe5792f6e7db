use crate::config::ScanConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Finds the build systems in a source tree and extracts their dependencies
#[derive(Parser, Debug)]
#[command(
    name = "bomscan",
    about = "Detect build systems and extract dependencies from a source tree",
    version,
    author,
    long_about = "bomscan walks a source directory, decides which detectors apply in each \
                  directory, checks that their tooling is available and extracts the declared \
                  dependencies. Supports Go modules, Go dep lock files and Gradle builds."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Scan a source directory",
        long_about = "Builds the directory tree, evaluates every detector against it and \
                      prints a summary of applicable detectors and extracted dependencies.\n\n\
                      Examples:\n  \
                      bomscan scan\n  \
                      bomscan scan /path/to/repo --format json\n  \
                      bomscan scan --exclude-rule gradle-inspector --max-depth 3"
    )]
    Scan(ScanArgs),

    #[command(
        about = "List the built-in detector rules",
        long_about = "Prints every rule in evaluation order with its group, nesting \
                      behaviour, yield targets and fallback relationships."
    )]
    Rules(RulesArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(
        value_name = "PATH",
        help = "Directory to scan (defaults to current directory)"
    )]
    pub source_path: Option<PathBuf>,

    #[arg(long, help = "Search below directories where a rule already applied")]
    pub force_nested: bool,

    #[arg(long, value_name = "DEPTH", help = "Deepest directory level to search")]
    pub max_depth: Option<usize>,

    #[arg(
        long = "include-rule",
        value_name = "RULE",
        help = "Only evaluate this rule id or group (repeatable)"
    )]
    pub include_rules: Vec<String>,

    #[arg(
        long = "exclude-rule",
        value_name = "RULE",
        help = "Skip this rule id or group (repeatable)"
    )]
    pub exclude_rules: Vec<String>,

    #[arg(
        long = "exclude-dir",
        value_name = "PATTERN",
        help = "Additional directory pattern to skip (repeatable)"
    )]
    pub exclude_dirs: Vec<String>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Base directory for extraction output"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Show a progress bar while extracting")]
    pub progress: bool,
}

impl ScanArgs {
    /// Layers the flags on top of the environment-derived configuration
    pub fn apply_to(&self, config: &mut ScanConfig) {
        if self.force_nested {
            config.force_nested = true;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if !self.include_rules.is_empty() {
            config.included_rules = self.include_rules.clone();
        }
        config.excluded_rules.extend(self.exclude_rules.iter().cloned());
        config.excluded_directories.extend(self.exclude_dirs.iter().cloned());
        if let Some(ref dir) = self.output_dir {
            config.output_dir = dir.clone();
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct RulesArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
