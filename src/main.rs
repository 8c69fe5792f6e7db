use bomscan::cli::commands::{CliArgs, Commands, RulesArgs, ScanArgs};
use bomscan::cli::output::{OutputFormat, OutputFormatter};
use bomscan::detectables::Detectables;
use bomscan::fs::{FileSystem, RealFileSystem};
use bomscan::util::logging::{init_logging, parse_level, LoggingConfig};
use bomscan::{
    CompositeListener, LoggingListener, ProgressListener, ScanConfig, ScanRunner, NAME, VERSION,
};

use clap::Parser;
use std::env;
use std::process;
use std::sync::Arc;
use tracing::{debug, error, info, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Scan(scan_args) => handle_scan(scan_args, args.quiet),
        Commands::Rules(rules_args) => handle_rules(rules_args),
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let mut config = LoggingConfig::from_env();
    config.level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        config.level
    };
    init_logging(config);
}

fn load_config(args: &ScanArgs) -> Option<ScanConfig> {
    let mut config = ScanConfig::default();
    args.apply_to(&mut config);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        eprintln!("Error: {}", e);
        return None;
    }
    debug!("{}", config);
    Some(config)
}

fn handle_scan(args: &ScanArgs, quiet: bool) -> i32 {
    let Some(config) = load_config(args) else {
        return 1;
    };

    let source_path = match &args.source_path {
        Some(path) => path.clone(),
        None => match env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                error!("Failed to determine current directory: {}", e);
                return 1;
            }
        },
    };

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem::new());
    let rule_set = match Detectables::new(fs.clone(), config.gradle_options()).rule_set() {
        Ok(rule_set) => Arc::new(rule_set),
        Err(e) => {
            error!("Invalid rule set: {}", e);
            return 1;
        }
    };

    let mut listener = CompositeListener::new().with(LoggingListener);
    if args.progress && !quiet && atty::is(atty::Stream::Stderr) {
        listener = listener.with(ProgressListener::new());
    }

    let report = match ScanRunner::new(fs, rule_set, config)
        .with_listener(listener)
        .run(&source_path)
    {
        Ok(report) => report,
        Err(e) => {
            error!("Scan failed: {}", e);
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let formatter = OutputFormatter::new(args.format.into());
    let output = match formatter.format_summary(&report.summary) {
        Ok(out) => out,
        Err(e) => {
            error!("Failed to format output: {}", e);
            return 1;
        }
    };

    write_output(&output, args.output.as_deref(), quiet)
}

fn handle_rules(args: &RulesArgs) -> i32 {
    let config = ScanConfig::default();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem::new());
    let rule_set = match Detectables::new(fs, config.gradle_options()).rule_set() {
        Ok(rule_set) => rule_set,
        Err(e) => {
            error!("Invalid rule set: {}", e);
            return 1;
        }
    };

    let format: OutputFormat = args.format.into();
    match OutputFormatter::new(format).format_rules(&rule_set) {
        Ok(output) => write_output(&output, None, false),
        Err(e) => {
            error!("Failed to format output: {}", e);
            1
        }
    }
}

fn write_output(output: &str, file: Option<&std::path::Path>, quiet: bool) -> i32 {
    let Some(output_file) = file else {
        println!("{}", output);
        return 0;
    };

    match std::fs::write(output_file, output) {
        Ok(_) => {
            info!("Output written to: {}", output_file.display());
            if !quiet {
                println!("Output written to: {}", output_file.display());
            }
            0
        }
        Err(e) => {
            error!("Failed to write output to file: {}", e);
            1
        }
    }
}
