//! `fluxforge-tui` — Terminal console for a FluxForge OPC UA gateway.
//!
//! Built on [ratatui](https://ratatui.rs) over the shared
//! `fluxforge-core` tag engine. Screens are navigable via number keys
//! (1-6): Dashboard, Devices, Tags, Scan Classes, InfluxDB, and
//! Telegraf; a Setup wizard takes over until the portal reports a
//! completed first-run configuration.
//!
//! Logs are written to a file (default `/tmp/fluxforge-tui.log`) to avoid
//! corrupting the terminal UI. A background bridge task executes portal
//! requests and feeds results back into the action loop.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fluxforge_api::{ClientConfig, PortalClient};
use fluxforge_core::Portal;

use crate::app::App;

/// Terminal console for administering a FluxForge gateway.
#[derive(Parser, Debug)]
#[command(name = "fluxforge-tui", version, about)]
struct Cli {
    /// Portal URL (e.g., http://gateway.plant.local:8000)
    #[arg(short = 'P', long, env = "FLUXFORGE_PORTAL")]
    portal: Option<String>,

    /// Portal profile from the shared config file
    #[arg(short = 'p', long, env = "FLUXFORGE_PROFILE")]
    profile: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(short = 'k', long, env = "FLUXFORGE_INSECURE")]
    insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "FLUXFORGE_TIMEOUT", default_value = "30")]
    timeout: u64,

    /// Log file path (defaults to /tmp/fluxforge-tui.log)
    #[arg(long, default_value = "/tmp/fluxforge-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fluxforge_tui={log_level}")));

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("fluxforge-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Resolve the portal URL and transport settings.
///
/// Priority: CLI flags > shared config file (selected profile).
fn build_portal(cli: &Cli) -> Result<Portal> {
    let config = fluxforge_config::load_config_or_default();

    let (url, profile_settings) = match &cli.portal {
        Some(url) => (url.clone(), None),
        None => {
            let name = cli
                .profile
                .clone()
                .or_else(|| config.default_profile.clone())
                .unwrap_or_else(|| "default".into());
            let profile = config.profiles.get(&name).ok_or_else(|| {
                eyre!(
                    "no portal configured: pass --portal or create a profile with `fluxforge config init`"
                )
            })?;
            (profile.portal.clone(), Some(profile.clone()))
        }
    };

    let client_config = ClientConfig {
        timeout: Duration::from_secs(cli.timeout),
        accept_invalid_certs: cli.insecure
            || profile_settings
                .and_then(|p| p.insecure)
                .unwrap_or(config.defaults.insecure),
    };

    let client = PortalClient::new(&url, &client_config)
        .map_err(|e| eyre!("invalid portal URL '{url}': {e}"))?;
    Ok(Portal::new(Arc::new(client)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    info!(
        portal = cli.portal.as_deref().unwrap_or("(from profile)"),
        "starting fluxforge-tui"
    );

    let portal = build_portal(&cli)?;
    let mut app = App::new(portal);
    app.run().await?;

    Ok(())
}
