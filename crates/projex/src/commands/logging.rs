//! Logging initialization.
//!
//! The server logs to stderr. Every other command logs to a file in the
//! platform log directory so stdout stays clean for piping.

use projex_core::Config;
use projex_util::log::{self, LogConfig, LogLevel};
use std::path::PathBuf;

/// Initialize logging. Returns the log file path if logging to a file.
pub fn init_logging(config: &Config, verbose: bool, serving: bool) -> Option<PathBuf> {
    let level = if verbose {
        LogLevel::Debug
    } else {
        config.log_level.unwrap_or_default()
    };

    let log_config = if serving || verbose {
        LogConfig::stderr(level)
    } else {
        LogConfig::default_file(level)
    };
    log::init(log_config.with_location(verbose))
}
