#![deny(unsafe_code)]

//! Configuration loading and validation for classmap.
//!
//! Loads `classmap.toml` and validates it. [`AppConfig`] names the index
//! roots to register, the cache backend that memoizes builds, the runtime
//! directives (developer mode) and the log level.
//!
//! ## TOML Example
//!
//! ```toml
//! [index]
//! roots = ["/srv/app", "/srv/shared"]
//!
//! [cache]
//! backend = "file"
//! dir = "/var/cache/classmap"
//!
//! [runtime]
//! developer_mode = false
//!
//! [logging]
//! level = "info"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Index roots.
    #[serde(default)]
    pub index: IndexConfig,

    /// Cache backend for built indexes and resolver snapshots.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Runtime directives.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Base directories registered with the resolver, in order.
///
/// Earlier roots take precedence: a symbol mapped by the first root is never
/// replaced by a later one.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub roots: Vec<String>,
}

/// Cache backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// "memory" (per process), "file" (JSON files under `dir`) or "none".
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// Directory for the file backend.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_backend() -> String {
    "memory".to_string()
}

fn default_cache_dir() -> String {
    ".classmap-cache".to_string()
}

/// Runtime directives consulted while building and resolving.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Sets `DEBUG_MODE`: every build bypasses the cache.
    #[serde(default)]
    pub developer_mode: bool,

    /// Additional named directives.
    #[serde(default)]
    pub directives: HashMap<String, bool>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), roots = config.index.roots.len(), "configuration loaded");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, root) in self.index.roots.iter().enumerate() {
            if root.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "index.roots[{i}] must not be empty"
                )));
            }
        }

        let valid_backends = ["memory", "file", "none"];
        if !valid_backends.contains(&self.cache.backend.as_str()) {
            return Err(ConfigError::Validation(format!(
                "cache.backend must be one of {:?}, got {:?}",
                valid_backends, self.cache.backend
            )));
        }
        if self.cache.backend == "file" && self.cache.dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cache.dir is required when cache.backend is \"file\"".to_string(),
            ));
        }

        if self.runtime.directives.keys().any(|name| name.is_empty()) {
            return Err(ConfigError::Validation(
                "runtime.directives names must not be empty".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.index.roots.is_empty());
        assert_eq!(config.cache.backend, "memory");
        assert_eq!(config.cache.dir, ".classmap-cache");
        assert!(!config.runtime.developer_mode);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.cache.backend, "memory");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [index]
            roots = ["/srv/app", "/srv/shared/"]

            [cache]
            backend = "file"
            dir = "/var/cache/classmap"

            [runtime]
            developer_mode = true

            [runtime.directives]
            TRACE_BUILDS = true

            [logging]
            level = "debug"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.index.roots, vec!["/srv/app", "/srv/shared/"]);
        assert_eq!(config.cache.backend, "file");
        assert_eq!(config.cache.dir, "/var/cache/classmap");
        assert!(config.runtime.developer_mode);
        assert_eq!(config.runtime.directives.get("TRACE_BUILDS"), Some(&true));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_empty_root() {
        let toml = r#"
            [index]
            roots = ["/srv/app", "  "]
        "#;
        let err = AppConfig::parse(toml).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: index.roots[1] must not be empty"
        );
    }

    #[test]
    fn test_validation_rejects_unknown_backend() {
        let toml = r#"
            [cache]
            backend = "redis"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_requires_dir_for_file_backend() {
        let toml = r#"
            [cache]
            backend = "file"
            dir = ""
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_empty_dir_allowed_for_memory_backend() {
        let toml = r#"
            [cache]
            backend = "memory"
            dir = ""
        "#;
        assert!(AppConfig::parse(toml).is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_log_level() {
        let toml = r#"
            [logging]
            level = "verbose"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_directive_name() {
        let toml = r#"
            [runtime.directives]
            "" = true
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let mut config = AppConfig::default();
        config.index.roots.push("/srv/app".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = AppConfig::parse(&text).unwrap();
        assert_eq!(parsed.index.roots, config.index.roots);
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[test_log::test(tokio::test)]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("classmap.toml");
        tokio::fs::write(&path, b"[index]\nroots = [\"/srv/app\"]\n")
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.index.roots, vec!["/srv/app"]);
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/classmap.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[")
            .await
            .unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    // ── Error display ─────────────────────────────────────────────────

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }
}
