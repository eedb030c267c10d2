//! InfluxDB connection target command handlers.

use tabled::Tabled;

use fluxforge_api::types::{InfluxConfig, InfluxConfigPayload, InfluxTestPayload};
use fluxforge_core::Portal;

use crate::cli::{GlobalOpts, InfluxdbArgs, InfluxdbCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct InfluxRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Org")]
    org: String,
    #[tabled(rename = "Bucket")]
    bucket: String,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Devices")]
    devices: i64,
}

impl From<&InfluxConfig> for InfluxRow {
    fn from(c: &InfluxConfig) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            url: c.url.clone(),
            org: c.org.clone(),
            bucket: c.bucket.clone(),
            default: if c.is_default { "*" } else { "" }.into(),
            devices: c.device_count,
        }
    }
}

fn find_config(configs: &[InfluxConfig], id: i64) -> Result<&InfluxConfig, CliError> {
    configs.iter().find(|c| c.id == id).ok_or_else(|| {
        CliError::NotFound {
            resource_type: "InfluxDB config".into(),
            identifier: id.to_string(),
            list_command: "influxdb list".into(),
        }
    })
}

#[allow(clippy::too_many_lines)]
pub async fn handle(
    portal: &Portal,
    args: InfluxdbArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = portal.client();

    match args.command {
        InfluxdbCommand::List => {
            let configs = client.list_influx_configs().await?;
            let out = output::render_list(
                &global.output,
                &configs,
                |c| InfluxRow::from(c),
                |c| c.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InfluxdbCommand::Create {
            name,
            url,
            token,
            org,
            bucket,
            default,
        } => {
            let created = client
                .create_influx_config(&InfluxConfigPayload {
                    name,
                    url,
                    token,
                    org,
                    bucket,
                    is_default: default,
                })
                .await?;
            if !global.quiet {
                eprintln!(
                    "InfluxDB config '{}' created (id {})",
                    created.name, created.id
                );
            }
            Ok(())
        }

        InfluxdbCommand::Update {
            id,
            name,
            url,
            token,
            org,
            bucket,
            default,
        } => {
            let configs = client.list_influx_configs().await?;
            let current = find_config(&configs, id)?;

            let updated = client
                .update_influx_config(
                    id,
                    &InfluxConfigPayload {
                        name: name.unwrap_or_else(|| current.name.clone()),
                        url: url.unwrap_or_else(|| current.url.clone()),
                        token: token.unwrap_or_else(|| current.token.clone()),
                        org: org.unwrap_or_else(|| current.org.clone()),
                        bucket: bucket.unwrap_or_else(|| current.bucket.clone()),
                        is_default: default.unwrap_or(current.is_default),
                    },
                )
                .await?;

            if !global.quiet {
                eprintln!("InfluxDB config '{}' updated", updated.name);
            }
            Ok(())
        }

        InfluxdbCommand::Delete { id } => {
            client.delete_influx_config(id).await?;
            if !global.quiet {
                eprintln!("InfluxDB config {id} deleted");
            }
            Ok(())
        }

        InfluxdbCommand::Test { id } => {
            let result = client.test_influx_config(id).await?;
            report_test(result.success, &result.message, global)
        }

        InfluxdbCommand::TestConnection { url, token, org } => {
            let result = client
                .test_influx_connection_raw(&InfluxTestPayload { url, token, org })
                .await?;
            report_test(result.success, &result.message, global)
        }

        InfluxdbCommand::Buckets { id } => {
            let buckets = client.list_influx_buckets(id).await?;
            if !global.quiet {
                for bucket in &buckets.buckets {
                    println!("{bucket}");
                }
            }
            Ok(())
        }
    }
}

fn report_test(success: bool, message: &str, global: &GlobalOpts) -> Result<(), CliError> {
    if success {
        if !global.quiet {
            eprintln!(
                "{} Connection OK: {message}",
                output::ok_mark(&global.color)
            );
        }
        Ok(())
    } else {
        Err(CliError::Api {
            status: 0,
            message: message.to_owned(),
        })
    }
}
