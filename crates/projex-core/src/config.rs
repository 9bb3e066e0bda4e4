//! Configuration management for projex.
//!
//! Configuration is loaded from multiple sources and merged:
//! 1. Global config: `~/.config/projex/config.json`
//! 2. Environment variable: `PROJEX_CONFIG_CONTENT`
//! 3. Project config: `projex.jsonc` or `projex.json` in the working directory
//!
//! Command line flags are applied on top by the binary.
//!
//! Supports JSONC (JSON with comments) and variable substitution:
//! - `{env:VAR_NAME}` - Substitute environment variable
//! - `{file:path}` - Substitute file contents

use crate::error::{ConfigError, CoreResult};
use projex_snapshot::{default_workers, ExcludedDirs, SnapshotCollector, TreeWalker};
use projex_util::log::LogLevel;
use projex_util::path::{expand_home, runs_dir};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Environment variable holding inline JSONC configuration.
pub const CONFIG_CONTENT_ENV: &str = "PROJEX_CONFIG_CONTENT";

/// Default HTTP listen address.
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8000";

static VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

fn var_regex() -> &'static regex::Regex {
    VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\{(env|file):([^}]+)\}")
            .expect("Invalid regex pattern - this is a compile-time constant")
    })
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON Schema reference.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Log level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    /// Directory names pruned from snapshots. Replaces the default set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_dirs: Option<Vec<String>>,

    /// Size of the file classification pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,

    /// Where export runs are stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<String>,

    /// HTTP server settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Allow cross-origin requests from any origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<bool>,
}

impl ServerConfig {
    /// Merge another config into this one (other takes precedence).
    pub fn merge(mut self, other: Self) -> Self {
        if other.address.is_some() {
            self.address = other.address;
        }
        if other.cors.is_some() {
            self.cors = other.cors;
        }
        self
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Loading order (later sources override earlier):
    /// 1. Global config from `~/.config/projex/`
    /// 2. `PROJEX_CONFIG_CONTENT` environment variable
    /// 3. Project config from `project_dir`
    pub async fn load(project_dir: Option<&Path>) -> CoreResult<(Self, Vec<PathBuf>)> {
        let mut config = Config::default();
        let mut sources = Vec::new();

        if let Some(global_dir) = Self::global_config_dir() {
            for name in &["config.json", "projex.json", "projex.jsonc"] {
                let path = global_dir.join(name);
                if path.exists() {
                    let loaded = Self::load_file(&path).await?;
                    config = config.merge(loaded);
                    sources.push(path);
                    break;
                }
            }
        }

        if let Ok(content) = std::env::var(CONFIG_CONTENT_ENV) {
            let loaded = Self::parse_jsonc(&content, "<env>")?;
            config = config.merge(loaded);
        }

        if let Some(dir) = project_dir {
            for name in &["projex.jsonc", "projex.json"] {
                let path = dir.join(name);
                if path.exists() {
                    let loaded = Self::load_file(&path).await?;
                    config = config.merge(loaded);
                    sources.push(path);
                    break;
                }
            }
        }

        tracing::debug!(sources = sources.len(), "Loaded configuration");
        Ok((config, sources))
    }

    /// Get the global config directory.
    ///
    /// On Unix, `~/.config/projex` is preferred over the platform directory
    /// when it exists.
    pub fn global_config_dir() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            if let Some(home) = dirs::home_dir() {
                let xdg_config = home.join(".config").join("projex");
                if xdg_config.exists() {
                    return Some(xdg_config);
                }
            }
        }

        projex_util::path::config_dir()
    }

    /// Load configuration from a file.
    pub async fn load_file(path: &Path) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let content = Self::substitute_variables(&content, path)?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    fn parse_jsonc(content: &str, source: &str) -> CoreResult<Self> {
        let stripped = Self::strip_comments(content);

        serde_json::from_str(&stripped).map_err(|e| {
            ConfigError::InvalidJson {
                path: source.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Strip `//` and `/* */` comments outside of string literals.
    fn strip_comments(input: &str) -> String {
        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();
        let mut in_string = false;
        let mut escape_next = false;

        while let Some(c) = chars.next() {
            if escape_next {
                result.push(c);
                escape_next = false;
                continue;
            }

            if in_string {
                match c {
                    '\\' => escape_next = true,
                    '"' => in_string = false,
                    _ => {}
                }
                result.push(c);
                continue;
            }

            match (c, chars.peek()) {
                ('"', _) => {
                    in_string = true;
                    result.push(c);
                }
                ('/', Some(&'/')) => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            result.push('\n');
                            break;
                        }
                    }
                }
                ('/', Some(&'*')) => {
                    chars.next();
                    let mut prev = ' ';
                    for c in chars.by_ref() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        // Keep line numbers stable for parse errors
                        if c == '\n' {
                            result.push('\n');
                        }
                        prev = c;
                    }
                }
                _ => result.push(c),
            }
        }

        result
    }

    /// Substitute `{env:NAME}` and `{file:path}` references.
    ///
    /// File references are relative to the config file and are trimmed.
    fn substitute_variables(content: &str, config_path: &Path) -> CoreResult<String> {
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        let mut result = content.to_string();

        for cap in var_regex().captures_iter(content) {
            let (Some(full_match), Some(kind), Some(value)) = (cap.get(0), cap.get(1), cap.get(2))
            else {
                continue;
            };
            let value = value.as_str();

            let replacement = match kind.as_str() {
                "env" => std::env::var(value).map_err(|_| ConfigError::EnvVarNotFound {
                    name: value.to_string(),
                })?,
                "file" => {
                    let file_path = config_dir.join(value);
                    std::fs::read_to_string(&file_path)
                        .map(|v| v.trim().to_string())
                        .map_err(|_| ConfigError::FileRefNotFound {
                            path: file_path.display().to_string(),
                        })?
                }
                _ => continue,
            };

            result = result.replace(full_match.as_str(), &replacement);
        }

        Ok(result)
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(mut self, other: Self) -> Self {
        if other.schema.is_some() {
            self.schema = other.schema;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.excluded_dirs.is_some() {
            self.excluded_dirs = other.excluded_dirs;
        }
        if other.max_workers.is_some() {
            self.max_workers = other.max_workers;
        }
        if other.storage_dir.is_some() {
            self.storage_dir = other.storage_dir;
        }

        self.server = match (self.server, other.server) {
            (Some(base), Some(other)) => Some(base.merge(other)),
            (base, None) => base,
            (None, other) => other,
        };

        self
    }

    /// Effective excluded-directory set.
    pub fn excluded(&self) -> ExcludedDirs {
        match &self.excluded_dirs {
            Some(names) => ExcludedDirs::new(names.iter().cloned()),
            None => ExcludedDirs::default(),
        }
    }

    /// Effective worker count.
    pub fn workers(&self) -> usize {
        self.max_workers.unwrap_or_else(default_workers)
    }

    /// Snapshot collector built from this configuration.
    pub fn collector(&self) -> SnapshotCollector {
        SnapshotCollector::new(TreeWalker::new(self.excluded()), self.workers())
    }

    /// Effective storage directory for export runs.
    pub fn storage_path(&self) -> CoreResult<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(expand_home(dir)),
            None => runs_dir().ok_or_else(|| {
                ConfigError::InvalidPath("Could not determine data directory".to_string()).into()
            }),
        }
    }

    /// Effective HTTP listen address.
    pub fn server_address(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.address.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string())
    }

    /// Whether permissive CORS is enabled. On by default.
    pub fn cors_enabled(&self) -> bool {
        self.server.as_ref().and_then(|s| s.cors).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use std::ffi::OsStr;
    use tempfile::TempDir;

    #[test]
    fn test_strip_comments() {
        let input = r#"{
            // Line comment
            "key": "value", // trailing comment
            /* block comment */
            "key2": "val/*not a comment*/ue",
            "url": "http://example.com"
        }"#;

        let result = Config::strip_comments(input);
        assert!(!result.contains("Line comment"));
        assert!(!result.contains("trailing comment"));
        assert!(!result.contains("block comment"));
        assert!(result.contains("val/*not a comment*/ue"));
        assert!(result.contains("http://example.com"));
    }

    #[test]
    fn test_strip_comments_escaped_quote() {
        let input = r#"{ "a": "say \"hi\" // not a comment" }"#;
        assert_eq!(Config::strip_comments(input), input);
    }

    #[test]
    fn test_parse_jsonc() {
        let input = r#"{
            // This is a comment
            "log_level": "debug",
            "excluded_dirs": ["vendor", ".git"],
            "max_workers": 8,
            "server": { "address": "0.0.0.0:9000" }
        }"#;

        let config = Config::parse_jsonc(input, "test").unwrap();
        assert_eq!(config.log_level, Some(LogLevel::Debug));
        assert_eq!(config.workers(), 8);
        assert_eq!(config.server_address(), "0.0.0.0:9000");
        assert!(config.cors_enabled());

        let excluded = config.excluded();
        assert!(excluded.contains(OsStr::new("vendor")));
        assert!(!excluded.contains(OsStr::new("node_modules")));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = Config::parse_jsonc("{ not json", "broken.json").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidJson { ref path, .. }) if path == "broken.json"
        ));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_address(), DEFAULT_SERVER_ADDRESS);
        assert!(config.workers() >= 4);
        assert!(config.excluded().contains(OsStr::new("node_modules")));
    }

    #[test]
    fn test_merge_config() {
        let base = Config {
            log_level: Some(LogLevel::Warn),
            max_workers: Some(2),
            server: Some(ServerConfig {
                address: Some("127.0.0.1:1".into()),
                cors: Some(false),
            }),
            ..Default::default()
        };

        let other = Config {
            max_workers: Some(16),
            storage_dir: Some("/srv/runs".into()),
            server: Some(ServerConfig {
                address: Some("127.0.0.1:2".into()),
                cors: None,
            }),
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.log_level, Some(LogLevel::Warn));
        assert_eq!(merged.max_workers, Some(16));
        assert_eq!(merged.storage_path().unwrap(), PathBuf::from("/srv/runs"));
        assert_eq!(merged.server_address(), "127.0.0.1:2");
        assert!(!merged.cors_enabled());
    }

    #[test]
    fn test_substitute_file_reference() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("runs-path"), "/data/runs\n").unwrap();
        let config_path = dir.path().join("projex.json");

        let result =
            Config::substitute_variables(r#"{"storage_dir": "{file:runs-path}"}"#, &config_path)
                .unwrap();
        assert_eq!(result, r#"{"storage_dir": "/data/runs"}"#);
    }

    #[test]
    fn test_substitute_missing_references() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("projex.json");

        let err = Config::substitute_variables("{env:PROJEX_TEST_SURELY_UNSET_VAR}", &config_path)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::EnvVarNotFound { .. })
        ));

        let err = Config::substitute_variables("{file:missing.txt}", &config_path).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::FileRefNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("projex.jsonc"),
            r#"{
                // project overrides
                "max_workers": 3,
                "excluded_dirs": ["dist"]
            }"#,
        )
        .unwrap();

        let (config, sources) = Config::load(Some(dir.path())).await.unwrap();

        assert_eq!(sources.last(), Some(&dir.path().join("projex.jsonc")));
        assert_eq!(config.max_workers, Some(3));
        assert_eq!(config.collector().max_workers(), 3);
        assert_eq!(config.excluded().iter().collect::<Vec<_>>(), vec!["dist"]);
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let config = Config {
            max_workers: Some(4),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&config).unwrap(),
            r#"{"max_workers":4}"#
        );
    }
}
