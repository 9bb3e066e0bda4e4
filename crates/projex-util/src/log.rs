//! Logging setup using tracing.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ]
        .into_iter()
        .find(|level| level.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("Unknown log level: {s}"))
    }
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Append to this file, creating parent directories.
    File(PathBuf),
    /// Install filtering only.
    Discard,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub target: LogTarget,
    pub level: LogLevel,
    /// Include source file and line in each line.
    pub include_location: bool,
}

impl LogConfig {
    /// Log to stderr at `level`.
    pub fn stderr(level: LogLevel) -> Self {
        Self {
            target: LogTarget::Stderr,
            level,
            include_location: false,
        }
    }

    /// Log to the default file if one can be located, otherwise discard.
    pub fn default_file(level: LogLevel) -> Self {
        Self {
            target: default_log_path().map_or(LogTarget::Discard, LogTarget::File),
            level,
            include_location: false,
        }
    }

    pub fn with_location(mut self, include: bool) -> Self {
        self.include_location = include;
        self
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured level. Returns the log file when one
/// was opened. A file that cannot be opened is reported on stderr and logging
/// is discarded.
pub fn init(config: LogConfig) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    let location = config.include_location;

    match config.target {
        LogTarget::Stderr => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_file(location)
                .with_line_number(location);
            let _ = registry.with(layer).try_init();
            None
        }
        LogTarget::File(path) => match open_append(&path) {
            Ok(file) => {
                let layer = fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_file(location)
                    .with_line_number(location);
                let _ = registry.with(layer).try_init();
                Some(path)
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {}: {e}", path.display());
                let _ = registry.try_init();
                None
            }
        },
        LogTarget::Discard => {
            let _ = registry.try_init();
            None
        }
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// `projex.log` in the platform log directory.
pub fn default_log_path() -> Option<PathBuf> {
    crate::path::logs_dir().map(|p| p.join("projex.log"))
}
