//! Configuration for the refetch CLI and other embedders.
//!
//! TOML file + `REFETCH_`-prefixed environment variables, layered over
//! built-in defaults, and translation to `refetch_core::RevalidatorConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use refetch_core::{RequestDefaults, RevalidatorConfig, TransportConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Base URL relative locators are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Override the `User-Agent` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Default output format for the CLI.
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Fallbacks for options a request leaves unset.
    #[serde(default)]
    pub requests: RequestDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: default_timeout(),
            user_agent: None,
            output: default_output(),
            color: default_color(),
            headers: BTreeMap::new(),
            requests: RequestDefaults::default(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_output() -> String {
    "json".into()
}
fn default_color() -> String {
    "auto".into()
}

impl Config {
    /// Translate into the engine configuration, validating as we go.
    pub fn to_revalidator_config(&self) -> Result<RevalidatorConfig, ConfigError> {
        let base_url = self
            .base_url
            .as_deref()
            .map(|raw| {
                raw.parse::<Url>().map_err(|e| ConfigError::Validation {
                    field: "base_url".into(),
                    reason: format!("invalid URL '{raw}': {e}"),
                })
            })
            .transpose()?;

        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        let mut transport = TransportConfig {
            timeout: Duration::from_secs(self.timeout),
            base_url,
            default_headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            ..TransportConfig::default()
        };
        if let Some(ref agent) = self.user_agent {
            transport.user_agent.clone_from(agent);
        }

        Ok(RevalidatorConfig {
            transport,
            defaults: self.requests.clone(),
        })
    }

    /// The TOML document [`save_config_to`] would write.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("rs", "refetch", "refetch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("refetch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load Config from `path` + environment. A missing file is not an error.
///
/// Nested keys use a double underscore: `REFETCH_REQUESTS__ATTEMPTS=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("REFETCH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parent
/// directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, cfg.to_toml_string()?)?;
    Ok(())
}
