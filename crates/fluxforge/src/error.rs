//! CLI error types with miette diagnostics.
//!
//! Maps API and core errors into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use fluxforge_core::CoreError;

/// Exit codes per command outcome.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(dead_code)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to the portal")]
    #[diagnostic(
        code(fluxforge::connection_failed),
        help(
            "Check that the gateway portal is running and reachable.\n\
             Reason: {reason}\n\
             Try: fluxforge metrics --portal http://<gateway-host>:8000"
        )
    )]
    ConnectionFailed { reason: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(fluxforge::not_found),
        help("Run: fluxforge {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Portal error (HTTP {status}): {message}")]
    #[diagnostic(code(fluxforge::api_error))]
    Api { status: u16, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fluxforge::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fluxforge::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fluxforge config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No portal configured")]
    #[diagnostic(
        code(fluxforge::no_config),
        help(
            "Pass --portal, set FLUXFORGE_PORTAL, or create a config with: fluxforge config init\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(fluxforge::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out")]
    #[diagnostic(
        code(fluxforge::timeout),
        help("Increase the timeout with --timeout or check portal responsiveness.")
    )]
    Timeout,

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(fluxforge::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Api { status: 409, .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── API / core error mapping ─────────────────────────────────────────

impl From<fluxforge_api::Error> for CliError {
    fn from(err: fluxforge_api::Error) -> Self {
        match err {
            fluxforge_api::Error::Api { status, detail } => Self::Api {
                status,
                message: detail,
            },
            fluxforge_api::Error::Transport(e) if e.is_timeout() => Self::Timeout,
            fluxforge_api::Error::Transport(e) => Self::ConnectionFailed {
                reason: e.to_string(),
            },
            fluxforge_api::Error::InvalidUrl(e) => Self::Validation {
                field: "portal".into(),
                reason: e.to_string(),
            },
            fluxforge_api::Error::Deserialization { message, .. } => Self::Api {
                status: 0,
                message: format!("unexpected response body: {message}"),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(api) => api.into(),
        }
    }
}

impl From<fluxforge_config::ConfigError> for CliError {
    fn from(err: fluxforge_config::ConfigError) -> Self {
        match err {
            fluxforge_config::ConfigError::ProfileNotFound { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            fluxforge_config::ConfigError::Validation { field, reason } => {
                Self::Validation { field, reason }
            }
            fluxforge_config::ConfigError::Io(e) => Self::Io(e),
            other => Self::Validation {
                field: "config".into(),
                reason: other.to_string(),
            },
        }
    }
}
