// Persistent configuration.
//
// `ConfigStore` is a flat JSON key-value file in the user's config
// directory. Commands load it once at start-up and derive an immutable
// `Settings` snapshot that is passed down to the archiver and the client.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::AliceError;

pub const KEY_API_KEY: &str = "apiKey";
pub const KEY_SERVER_URL: &str = "serverUrl";
pub const KEY_DEVELOPER_NAME: &str = "developerName";
pub const KEY_DEVELOPER_EMAIL: &str = "developerEmail";
pub const KEY_TIMEOUT_SECS: &str = "timeoutSecs";

pub const DEFAULT_SERVER_URL: &str = "https://alice-server.vercel.app";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Overrides the directory holding `config.json`.
pub const CONFIG_DIR_ENV: &str = "ALICE_CONFIG_DIR";

const CONFIG_FILE: &str = "config.json";

/// Key-value store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl ConfigStore {
    /// Open the store at its default location (see [`default_config_dir`]).
    pub fn open_default() -> Result<Self> {
        Self::open(default_config_path())
    }

    /// Open the store at `path`, starting from an empty store when the
    /// existing file cannot be read or parsed. The next `save` replaces it.
    /// Used by the verbs that rewrite the configuration.
    pub fn open_or_reset(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(path.clone()) {
            Ok(store) => store,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %format!("{err:#}"),
                    "ignoring unreadable config file; it will be overwritten"
                );
                Self {
                    path,
                    values: Map::new(),
                }
            }
        }
    }

    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            if raw.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("Config file {} is not a JSON object", path.display()))?
            }
        } else {
            Map::new()
        };
        debug!(path = %path.display(), keys = values.len(), "loaded config store");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored value, or `None` when unset or empty.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match self.values.get(key)? {
            Value::String(s) => s.clone(),
            Value::Null => return None,
            other => other.to_string(),
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .insert(key.to_string(), Value::String(value.into()));
    }

    /// Write the whole store back to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("Failed to write config file {}", self.path.display()))?;
        debug!(path = %self.path.display(), "saved config store");
        Ok(())
    }
}

/// `config.json` inside [`default_config_dir`].
pub fn default_config_path() -> PathBuf {
    default_config_dir().join(CONFIG_FILE)
}

/// `$ALICE_CONFIG_DIR`, else `<config_dir>/alice-sdk`.
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("alice-sdk")
}

/// Immutable snapshot of the configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub server_url: String,
    pub developer_name: String,
    pub developer_email: String,
    pub timeout: Option<Duration>,
}

impl Settings {
    pub fn from_store(store: &ConfigStore) -> Result<Self> {
        Self::resolve(store, None)
    }

    /// Snapshot with a per-invocation timeout (`--timeout` / env) taking
    /// precedence over the stored `timeoutSecs`. The stored value is only
    /// parsed when no override is given.
    pub fn resolve(store: &ConfigStore, timeout_override: Option<u64>) -> Result<Self> {
        let timeout_secs = match (timeout_override, store.get(KEY_TIMEOUT_SECS)) {
            (Some(secs), _) => secs,
            (None, Some(raw)) => raw.trim().parse::<u64>().map_err(|_| {
                AliceError::Configuration(format!(
                    "{KEY_TIMEOUT_SECS} must be a whole number of seconds, got {raw:?}"
                ))
            })?,
            (None, None) => DEFAULT_TIMEOUT_SECS,
        };
        Ok(Self {
            api_key: store.get(KEY_API_KEY).map(|k| k.trim().to_string()),
            server_url: store.get_or(KEY_SERVER_URL, DEFAULT_SERVER_URL),
            developer_name: store.get(KEY_DEVELOPER_NAME).unwrap_or_default(),
            developer_email: store.get(KEY_DEVELOPER_EMAIL).unwrap_or_default(),
            timeout: timeout_from_secs(timeout_secs),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// The API key, or a `ConfigurationError` when none is set.
    pub fn require_api_key(&self) -> Result<&str, AliceError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AliceError::Configuration("API key not configured. Run: alice init".into())
            })
    }

    /// `{server}/api/analyze`, tolerating trailing slashes on the base URL.
    pub fn analyze_endpoint(&self) -> String {
        format!("{}/api/analyze", self.server_url.trim_end_matches('/'))
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

/// First 15 characters followed by `...`, or `Not set`.
pub fn mask_api_key(key: Option<&str>) -> String {
    match key {
        Some(k) if !k.is_empty() => {
            let head: String = k.chars().take(15).collect();
            format!("{head}...")
        }
        _ => "Not set".to_string(),
    }
}
