//! Settings file loading and endpoint configuration extraction.
//!
//! Reads `~/.claude/settings.json` (or an override), then pulls the three
//! values the connectivity probe needs out of its `env` section.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const BASE_URL_KEY: &str = "ANTHROPIC_BASE_URL";
pub const AUTH_TOKEN_KEY: &str = "ANTHROPIC_AUTH_TOKEN";
pub const MODEL_KEY: &str = "ANTHROPIC_MODEL";

/// Required keys in the order they are validated and reported.
pub const REQUIRED_KEYS: [&str; 3] = [BASE_URL_KEY, AUTH_TOKEN_KEY, MODEL_KEY];

/// Failures while loading the settings file or extracting its configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("settings file {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read settings file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("incomplete configuration, missing: {}", .missing.join(", "))]
    IncompleteConfig {
        missing: Vec<&'static str>,
        has_env: bool,
    },
}

/// Parsed settings document.
#[derive(Debug, Clone)]
pub struct Settings {
    env: Option<Map<String, Value>>,
}

impl Settings {
    /// Parse a settings document. Only invalid JSON is an error; a document
    /// without an `env` object parses fine and fails at extraction time.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let document: Value = serde_json::from_str(raw)?;
        let env = match document {
            Value::Object(mut root) => match root.remove("env") {
                Some(Value::Object(env)) => Some(env),
                _ => None,
            },
            _ => None,
        };
        Ok(Self { env })
    }

    pub fn has_env(&self) -> bool {
        self.env.is_some()
    }

    fn env_string(&self, key: &str) -> Option<String> {
        self.env
            .as_ref()?
            .get(key)?
            .as_str()
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Extract the endpoint configuration, reporting every missing key.
    pub fn endpoint_config(&self) -> Result<EndpointConfig, SettingsError> {
        if !self.has_env() {
            warn!("Settings document has no 'env' section");
        }

        let values = REQUIRED_KEYS.map(|key| self.env_string(key));
        let missing: Vec<&'static str> = REQUIRED_KEYS
            .iter()
            .zip(&values)
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| *key)
            .collect();

        match values {
            [Some(base_url), Some(auth_token), Some(model)] => Ok(EndpointConfig {
                base_url,
                auth_token,
                model,
            }),
            _ => Err(SettingsError::IncompleteConfig {
                missing,
                has_env: self.has_env(),
            }),
        }
    }
}

/// Load and parse the settings file at `path`.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    debug!("Loading settings from {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            SettingsError::FileNotFound(path.to_path_buf())
        } else {
            SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    Settings::from_json(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Endpoint credentials extracted from the settings `env` section.
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: String,
    pub auth_token: String,
    pub model: String,
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}
