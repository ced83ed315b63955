//! Shared configuration for the voltly CLI.
//!
//! TOML station profiles, map-API-key resolution (env + keyring +
//! plaintext), and translation to `voltly_core::StationConfig`. The
//! charge service itself is unauthenticated; the key is only needed for
//! keyword discovery through the place search API.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use voltly_core::StationConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no map API key configured (needed for station search)")]
    NoApiKey,

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
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default station profile name.
    pub default_station: Option<String>,

    /// Map API key for place search (plaintext — prefer keyring or env).
    pub api_key: Option<String>,

    /// Environment variable name containing the map API key.
    pub api_key_env: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named station profiles.
    #[serde(default)]
    pub stations: HashMap<String, StationProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_station: Some("default".into()),
            api_key: None,
            api_key_env: None,
            defaults: Defaults::default(),
            stations: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    60
}

/// A named station profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct StationProfile {
    /// POI uid of the station (from a share link or `voltly find`).
    pub poi_uid: String,

    /// Display name override.
    pub name: Option<String>,

    /// Charge service base URL override.
    pub api_base: Option<String>,

    /// Override poll interval (seconds).
    pub poll_interval: Option<u64>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "voltly", "voltly").map_or_else(
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
    p.push("voltly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("VOLTLY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the map API key from the credential chain.
pub fn resolve_api_key(config: &Config) -> Result<SecretString, ConfigError> {
    // 1. Configured env var name
    if let Some(ref env_name) = config.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("voltly", "map-api-key") {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref key) = config.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoApiKey)
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `StationConfig` from a profile plus global defaults.
pub fn profile_to_station_config(
    profile: &StationProfile,
    defaults: &Defaults,
) -> Result<StationConfig, ConfigError> {
    if profile.poi_uid.is_empty() {
        return Err(ConfigError::Validation {
            field: "poi_uid".into(),
            reason: "must not be empty".into(),
        });
    }

    let api_base = match profile.api_base {
        Some(ref base) => base.parse().map_err(|_| ConfigError::Validation {
            field: "api_base".into(),
            reason: format!("invalid URL: {base}"),
        })?,
        None => StationConfig::default().api_base,
    };

    Ok(StationConfig {
        api_base,
        poi_uid: profile.poi_uid.clone(),
        name: profile.name.clone(),
        poll_interval: Duration::from_secs(
            profile.poll_interval.unwrap_or(defaults.poll_interval),
        ),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}
