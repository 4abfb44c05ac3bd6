//! Configuration Loading
//!
//! Reads `KEY=VALUE` pairs from a `.env` file into an immutable [`Settings`]
//! object. Nothing is written into the process environment; instead the
//! settings object is built once at startup and handed to every component.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Locations tried, in order, when no explicit `.env` path is given
pub const DEFAULT_ENV_PATHS: &[&str] = &[".env", "public/api/.env", "public/.env"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested `.env` file does not exist
    #[error(".env file not found at {0}")]
    EnvFileNotFound(PathBuf),

    /// The `.env` file exists but could not be parsed
    #[error("failed to read .env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// Required settings are missing or empty
    #[error("missing configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    /// A setting is present but cannot be parsed
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

/// Immutable key/value configuration
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Load settings from a `.env` file overlaid with the process environment
    ///
    /// Variables already present in the process environment take precedence
    /// over file values. When `explicit` is `None` the [`DEFAULT_ENV_PATHS`]
    /// are tried; finding none is not an error (the environment alone is used).
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::EnvFileNotFound(path.to_path_buf()));
            }
            Some(path) => Self::parse_file(path)?,
            None => match DEFAULT_ENV_PATHS.iter().map(Path::new).find(|p| p.exists()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "Loading .env file");
                    Self::parse_file(path)?
                }
                None => {
                    tracing::warn!("No .env file found, using process environment only");
                    Self::default()
                }
            },
        };

        settings.values.extend(std::env::vars());
        Ok(settings)
    }

    /// Parse a `.env` file without consulting the process environment
    pub fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let iter = dotenvy::from_path_iter(path).map_err(|source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        })?;

        let values = iter
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self { values })
    }

    /// Build settings from explicit pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Non-empty value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value for `key` or the given default
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Parse the value for `key`, falling back to `default` when absent
    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    /// `true` only for the literal value `true`
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    /// Value for a setting that must be present
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::Missing(vec![key.to_string()]))
    }

    /// Keys from `keys` that are absent or empty, in the given order
    pub fn missing(&self, keys: &[&str]) -> Vec<String> {
        keys.iter()
            .filter(|key| self.get(key).is_none())
            .map(|key| key.to_string())
            .collect()
    }

    /// Check that every key is present, reporting all missing keys at once
    pub fn require_all(&self, keys: &[&str]) -> Result<(), ConfigError> {
        let missing = self.missing(keys);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }
}
