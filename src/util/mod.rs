//! Process-level helpers shared by the binary and integration tests

pub mod logging;

pub use logging::{init_from_env, init_logging, LoggingConfig};
