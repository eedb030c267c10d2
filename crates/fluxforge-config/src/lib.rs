//! Shared configuration for the FluxForge CLI and TUI.
//!
//! TOML profiles merged with `FLUXFORGE_*` environment variables via
//! figment. Both binaries depend on this crate — the CLI adds
//! flag-aware resolution on top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fluxforge_api::ClientConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in configuration")]
    ProfileNotFound { name: String },

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

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named portal profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
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

/// A named portal profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Portal base URL (e.g., "http://gateway.plant.local:8000").
    pub portal: String,

    /// Accept self-signed TLS certificates for this portal.
    pub insecure: Option<bool>,

    /// Override request timeout in seconds.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "fluxforge", "fluxforge").map_or_else(
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
    p.push("fluxforge");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from an explicit path (the canonical path in production,
/// a scratch path in tests).
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FLUXFORGE_").split("_"));

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
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

/// Look up a profile by name.
pub fn find_profile<'a>(config: &'a Config, name: &str) -> Result<&'a Profile, ConfigError> {
    config
        .profiles
        .get(name)
        .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
}

/// Validate a profile's portal URL.
pub fn profile_url(profile: &Profile) -> Result<url::Url, ConfigError> {
    profile
        .portal
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "portal".into(),
            reason: format!("invalid URL: {}", profile.portal),
        })
}

/// Translate a profile into HTTP client settings.
pub fn profile_client_config(profile: &Profile, defaults: &Defaults) -> ClientConfig {
    ClientConfig {
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        accept_invalid_certs: profile.insecure.unwrap_or(defaults.insecure),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Config {
        let mut profiles = HashMap::new();
        profiles.insert(
            "plant".to_owned(),
            Profile {
                portal: "http://gateway.plant.local:8000".to_owned(),
                insecure: Some(true),
                timeout: Some(10),
            },
        );
        Config {
            default_profile: Some("plant".to_owned()),
            defaults: Defaults::default(),
            profiles,
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        save_config_to(&sample(), &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.default_profile.as_deref(), Some("plant"));
        let profile = find_profile(&loaded, "plant").unwrap();
        assert_eq!(profile.portal, "http://gateway.plant.local:8000");
        assert_eq!(profile.timeout, Some(10));
    }

    #[test]
    fn missing_profile_is_an_error() {
        let config = sample();
        assert!(matches!(
            find_profile(&config, "nope"),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn client_config_falls_back_to_defaults() {
        let profile = Profile {
            portal: "http://localhost:8000".to_owned(),
            insecure: None,
            timeout: None,
        };
        let cfg = profile_client_config(&profile, &Defaults::default());
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(!cfg.accept_invalid_certs);
    }

    #[test]
    fn invalid_portal_url_is_rejected() {
        let profile = Profile {
            portal: "not a url".to_owned(),
            insecure: None,
            timeout: None,
        };
        assert!(profile_url(&profile).is_err());
    }
}
