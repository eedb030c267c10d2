//! System configuration command handlers.

use fluxforge_api::types::{SystemConfig, SystemConfigUpdate};
use fluxforge_core::Portal;

use crate::cli::{GlobalOpts, SystemArgs, SystemCommand};
use crate::error::CliError;
use crate::output;

fn detail(c: &SystemConfig) -> String {
    [
        format!("Title:              {}", c.app_title),
        format!("Setup complete:     {}", if c.setup_complete { "yes" } else { "no" }),
        format!("InfluxDB URL:       {}", c.influxdb_url),
        format!("InfluxDB org:       {}", c.influxdb_org),
        format!("Default bucket:     {}", c.influxdb_default_bucket),
        format!("Telegraf config:    {}", c.telegraf_config_path),
        format!("Telegraf reload:    {}", c.telegraf_reload_command),
    ]
    .join("\n")
}

pub async fn handle(portal: &Portal, args: SystemArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let client = portal.client();

    match args.command {
        SystemCommand::Show => {
            let config = client.get_system_config().await?;
            let out = output::render_single(&global.output, &config, detail, |c| {
                c.app_title.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SystemCommand::Set {
            app_title,
            influxdb_url,
            influxdb_token,
            influxdb_org,
            influxdb_bucket,
            telegraf_config_path,
            telegraf_reload_command,
        } => {
            // Read-modify-write: the portal expects the full document.
            let current = client.get_system_config().await?;

            let updated = client
                .update_system_config(&SystemConfigUpdate {
                    influxdb_url: influxdb_url.unwrap_or(current.influxdb_url),
                    influxdb_token: influxdb_token.unwrap_or(current.influxdb_token),
                    influxdb_org: influxdb_org.unwrap_or(current.influxdb_org),
                    influxdb_default_bucket: influxdb_bucket
                        .unwrap_or(current.influxdb_default_bucket),
                    telegraf_config_path: telegraf_config_path
                        .unwrap_or(current.telegraf_config_path),
                    telegraf_reload_command: telegraf_reload_command
                        .unwrap_or(current.telegraf_reload_command),
                    app_title: app_title.unwrap_or(current.app_title),
                })
                .await?;

            if !global.quiet {
                eprintln!("System configuration updated ('{}')", updated.app_title);
            }
            Ok(())
        }

        SystemCommand::TestInfluxdb => {
            let result = client.test_system_influxdb().await?;
            if result.success {
                if !global.quiet {
                    eprintln!("Connection OK: {}", result.message);
                }
                Ok(())
            } else {
                Err(CliError::Api {
                    status: 0,
                    message: result.message,
                })
            }
        }
    }
}
