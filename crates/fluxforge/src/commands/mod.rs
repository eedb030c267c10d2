//! Command handlers, one module per top-level subcommand.

pub mod config_cmd;
pub mod devices;
pub mod influxdb;
pub mod metrics;
pub mod scan_classes;
pub mod system;
pub mod tags;
pub mod telegraf;
pub mod util;

use fluxforge_core::Portal;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a parsed command to its handler.
pub async fn dispatch(cmd: Command, portal: &Portal, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(portal, args, global).await,
        Command::Tags(args) => tags::handle(portal, args, global).await,
        Command::ScanClasses(args) => scan_classes::handle(portal, args, global).await,
        Command::Influxdb(args) => influxdb::handle(portal, args, global).await,
        Command::Telegraf(args) => telegraf::handle(portal, args, global).await,
        Command::System(args) => system::handle(portal, args, global).await,
        Command::Metrics => metrics::handle(portal, global).await,

        // Handled before a portal connection exists.
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
