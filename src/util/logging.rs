//! Structured logging setup
//!
//! Initializes a `tracing-subscriber` registry once per process. Logs go to
//! stderr so that `--format json` output on stdout stays machine readable.
//!
//! # Environment Variables
//!
//! - `BOMSCAN_LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! - `BOMSCAN_LOG_JSON` - emit JSON lines instead of pretty text (true/false)
//! - `RUST_LOG` - standard filter directives, overriding the level above

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,

    /// JSON lines instead of pretty console output
    pub use_json: bool,

    /// Include the module target (e.g., bomscan::evaluator) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Reads `BOMSCAN_LOG_LEVEL` and `BOMSCAN_LOG_JSON`
    pub fn from_env() -> Self {
        let level_str = env::var("BOMSCAN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let use_json = env::var("BOMSCAN_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level: parse_level(&level_str),
            use_json,
            ..Default::default()
        }
    }
}

/// Parses a log level, falling back to INFO for unknown values
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(format!("bomscan={}", level))
}

/// Installs the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
        assert_eq!(parse_level("INFO"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
        assert!(config.include_target);
        assert!(!config.include_location);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        let old_level = env::var("BOMSCAN_LOG_LEVEL").ok();
        let old_json = env::var("BOMSCAN_LOG_JSON").ok();
        env::set_var("BOMSCAN_LOG_LEVEL", "debug");
        env::set_var("BOMSCAN_LOG_JSON", "true");

        let config = LoggingConfig::from_env();

        match old_level {
            Some(v) => env::set_var("BOMSCAN_LOG_LEVEL", v),
            None => env::remove_var("BOMSCAN_LOG_LEVEL"),
        }
        match old_json {
            Some(v) => env::set_var("BOMSCAN_LOG_JSON", v),
            None => env::remove_var("BOMSCAN_LOG_JSON"),
        }

        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
    }
}
