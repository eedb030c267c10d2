//! CLI configuration — thin wrapper around `fluxforge_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--portal, --insecure, --timeout).

use std::sync::Arc;
use std::time::Duration;

use fluxforge_api::{ClientConfig, PortalClient};
use fluxforge_core::Portal;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use fluxforge_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the [`Portal`] handle from the config file, profile, and CLI
/// overrides. Flag > env > profile precedence for every field.
pub fn build_portal(global: &GlobalOpts) -> Result<Portal, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let profile = cfg.profiles.get(&profile_name);

    // 1. Portal URL (flag > env > profile)
    let url = match (&global.portal, profile) {
        (Some(url), _) => url.clone(),
        (None, Some(profile)) => profile.portal.clone(),
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    // 2. Transport settings
    let client_config = ClientConfig {
        timeout: Duration::from_secs(global.timeout),
        accept_invalid_certs: global.insecure
            || profile.and_then(|p| p.insecure).unwrap_or(cfg.defaults.insecure),
    };

    let client = PortalClient::new(&url, &client_config).map_err(|_| CliError::Validation {
        field: "portal".into(),
        reason: format!("invalid URL: {url}"),
    })?;

    Ok(Portal::new(Arc::new(client)))
}
