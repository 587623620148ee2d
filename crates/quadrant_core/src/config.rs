//! Process configuration read from environment variables.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - Malformed values are rejected instead of silently ignored.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::classify::HttpClassifierConfig;
use crate::logging::{default_log_level, normalize_level};

pub const ENV_DB_PATH: &str = "QUADRANT_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "QUADRANT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "QUADRANT_LOG_DIR";
pub const ENV_CLASSIFIER_URL: &str = "QUADRANT_CLASSIFIER_URL";
pub const ENV_CLASSIFIER_KEY: &str = "QUADRANT_CLASSIFIER_KEY";
pub const ENV_CLASSIFIER_MODEL: &str = "QUADRANT_CLASSIFIER_MODEL";

const DB_FILE_NAME: &str = "quadrant.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(String),
    InvalidClassifierUrl(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{ENV_LOG_LEVEL}: {message}"),
            Self::RelativeLogDir(value) => {
                write!(f, "{ENV_LOG_DIR} must be an absolute path, got `{value}`")
            }
            Self::InvalidClassifierUrl(value) => {
                write!(f, "{ENV_CLASSIFIER_URL} must be an http(s) URL, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Present only when an API key is configured.
    pub classifier: Option<HttpClassifierConfig>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
            log_dir: None,
            classifier: None,
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = var(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = var(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level)
                .map_err(|err| ConfigError::InvalidLogLevel(err.to_string()))?;
        }
        if let Some(dir) = var(ENV_LOG_DIR) {
            let path = PathBuf::from(&dir);
            if !path.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(path);
        }
        if let Some(api_key) = var(ENV_CLASSIFIER_KEY) {
            let mut classifier = HttpClassifierConfig::new(api_key);
            if let Some(url) = var(ENV_CLASSIFIER_URL) {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(ConfigError::InvalidClassifierUrl(url));
                }
                classifier.endpoint = url;
            }
            if let Some(model) = var(ENV_CLASSIFIER_MODEL) {
                classifier.model = model;
            }
            config.classifier = Some(classifier);
        }
        Ok(config)
    }
}

/// Default slot database location when no path is configured.
pub fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).expect("defaults are valid");
        assert_eq!(config, CoreConfig::default());
        assert!(config.classifier.is_none());
    }

    #[test]
    fn classifier_needs_a_key() {
        let config = config_from(&[(ENV_CLASSIFIER_MODEL, "other-model")]).expect("valid");
        assert!(config.classifier.is_none());

        let config = config_from(&[
            (ENV_CLASSIFIER_KEY, "secret"),
            (ENV_CLASSIFIER_URL, "http://localhost:8080/v1"),
            (ENV_CLASSIFIER_MODEL, " other-model "),
        ])
        .expect("valid");
        let classifier = config.classifier.expect("key configured");
        assert_eq!(classifier.endpoint, "http://localhost:8080/v1");
        assert_eq!(classifier.model, "other-model");
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            config_from(&[(ENV_LOG_LEVEL, "loud")]),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            config_from(&[(ENV_LOG_DIR, "logs")]),
            Err(ConfigError::RelativeLogDir(_))
        ));
        assert!(matches!(
            config_from(&[(ENV_CLASSIFIER_KEY, "k"), (ENV_CLASSIFIER_URL, "ftp://x")]),
            Err(ConfigError::InvalidClassifierUrl(_))
        ));
    }

    #[test]
    fn level_and_paths_are_read() {
        let config = config_from(&[
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_DB_PATH, "/data/q.sqlite3"),
        ])
        .expect("valid");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.db_path, PathBuf::from("/data/q.sqlite3"));
    }
}
