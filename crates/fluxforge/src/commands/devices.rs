//! Device command handlers.

use std::time::Duration;

use tabled::Tabled;

use fluxforge_api::types::{Device, DevicePayload};
use fluxforge_core::{Portal, ScanState};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "InfluxDB")]
    influxdb: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            endpoint: d.endpoint_url.clone(),
            enabled: if d.enabled { "yes" } else { "no" }.into(),
            tags: format!("{}/{}", d.enabled_tag_count, d.tag_count),
            influxdb: d.influxdb_name.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

#[derive(Tabled)]
struct BrowseRow {
    #[tabled(rename = "Node ID")]
    node_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Type")]
    data_type: String,
    #[tabled(rename = "Children")]
    children: String,
}

fn detail(d: &Device) -> String {
    [
        format!("ID:         {}", d.id),
        format!("Name:       {}", d.name),
        format!("Endpoint:   {}", d.endpoint_url),
        format!("Security:   {}", d.security_policy),
        format!("Enabled:    {}", if d.enabled { "yes" } else { "no" }),
        format!("Tags:       {} ({} enabled)", d.tag_count, d.enabled_tag_count),
        format!(
            "InfluxDB:   {}",
            d.influxdb_name.as_deref().unwrap_or("-")
        ),
        format!("Created:    {}", d.created_at),
        format!("Updated:    {}", d.updated_at),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    portal: &Portal,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = portal.client();

    match args.command {
        DevicesCommand::List => {
            let devices = client.list_devices().await?;
            let out = output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::from(d),
                |d| d.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let found = util::resolve_device(portal, &device).await?;
            let out = output::render_single(&global.output, &found, detail, |d| d.id.to_string());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Create {
            name,
            endpoint,
            username,
            password,
            prompt_password,
            security_policy,
            influxdb,
            disabled,
        } => {
            let password = if prompt_password {
                rpassword::prompt_password("OPC UA password: ")
                    .map_err(|e| CliError::Io(std::io::Error::other(e)))?
            } else {
                password.unwrap_or_default()
            };

            let created = client
                .create_device(&DevicePayload {
                    name,
                    endpoint_url: endpoint,
                    username: username.unwrap_or_default(),
                    password,
                    security_policy,
                    influxdb_config_id: influxdb,
                    enabled: !disabled,
                })
                .await?;

            if !global.quiet {
                eprintln!("Device '{}' registered (id {})", created.name, created.id);
            }
            Ok(())
        }

        DevicesCommand::Update {
            device,
            name,
            endpoint,
            username,
            password,
            security_policy,
            influxdb,
            enabled,
        } => {
            let current = util::resolve_device(portal, &device).await?;

            // Merge flag overrides onto the current record; id 0 clears
            // the InfluxDB assignment.
            let influxdb_config_id = match influxdb {
                Some(0) => None,
                Some(id) => Some(id),
                None => current.influxdb_config_id,
            };

            let updated = client
                .update_device(
                    current.id,
                    &DevicePayload {
                        name: name.unwrap_or(current.name),
                        endpoint_url: endpoint.unwrap_or(current.endpoint_url),
                        username: username.unwrap_or(current.username),
                        password: password.unwrap_or(current.password),
                        security_policy: security_policy.unwrap_or(current.security_policy),
                        influxdb_config_id,
                        enabled: enabled.unwrap_or(current.enabled),
                    },
                )
                .await?;

            if !global.quiet {
                eprintln!("Device '{}' updated", updated.name);
            }
            Ok(())
        }

        DevicesCommand::Delete { device } => {
            let found = util::resolve_device(portal, &device).await?;
            if !util::confirm(
                &format!(
                    "Delete device '{}' and its {} tags?",
                    found.name, found.tag_count
                ),
                global.yes,
            )? {
                return Ok(());
            }
            client.delete_device(found.id).await?;
            if !global.quiet {
                eprintln!("Device '{}' deleted", found.name);
            }
            Ok(())
        }

        DevicesCommand::Test { device } => {
            let found = util::resolve_device(portal, &device).await?;
            let result = client.test_device_connection(found.id).await?;
            if result.success {
                if !global.quiet {
                    eprintln!(
                        "{} Connection OK: {}",
                        output::ok_mark(&global.color),
                        result.message
                    );
                }
                Ok(())
            } else {
                Err(CliError::Api {
                    status: 0,
                    message: result.message,
                })
            }
        }

        DevicesCommand::Browse { device, node } => {
            let found = util::resolve_device(portal, &device).await?;
            let result = client.browse_node(found.id, node.as_deref()).await?;
            let out = output::render_list(
                &global.output,
                &result.nodes,
                |n| BrowseRow {
                    node_id: n.node_id.clone(),
                    name: n.display_name.clone(),
                    class: n.node_class.clone(),
                    data_type: n.data_type.clone(),
                    children: if n.has_children { "+" } else { "" }.into(),
                },
                |n| n.node_id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Scan {
            device,
            wait,
            poll_ms,
        } => {
            let found = util::resolve_device(portal, &device).await?;

            // Never restart a running scan; with --wait, attach to it.
            let current = portal.scan_status(found.id).await.unwrap_or_default();
            if current.is_scanning() {
                if wait {
                    return wait_for_scan(portal, &found, current, poll_ms, global).await;
                }
                if !global.quiet {
                    eprintln!("Scan already in progress for '{}'", found.name);
                }
                return Ok(());
            }

            let state = portal.start_scan(found.id).await?;

            if !wait {
                if !global.quiet {
                    eprintln!("Scan started for '{}'", found.name);
                }
                return Ok(());
            }

            wait_for_scan(portal, &found, state, poll_ms, global).await
        }

        DevicesCommand::ScanStatus { device } => {
            let found = util::resolve_device(portal, &device).await?;
            let state = portal.scan_status(found.id).await?;
            print_scan_state(&found, &state, global);
            Ok(())
        }

        DevicesCommand::ClearScan { device } => {
            let found = util::resolve_device(portal, &device).await?;
            portal.clear_scan(found.id).await?;
            if !global.quiet {
                eprintln!("Scan cache cleared for '{}'", found.name);
            }
            Ok(())
        }
    }
}

/// Poll the scan status until it leaves `Scanning`, with a spinner on
/// interactive terminals.
async fn wait_for_scan(
    portal: &Portal,
    device: &Device,
    mut state: ScanState,
    poll_ms: u64,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spinner = if global.quiet {
        None
    } else {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_message(format!("Scanning '{}'...", device.name));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    while state.is_scanning() {
        tokio::time::sleep(Duration::from_millis(poll_ms)).await;
        state = portal.scan_status(device.id).await?;
    }

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match state {
        ScanState::Complete { ref nodes } => {
            if !global.quiet {
                eprintln!("Scan complete: {} variable nodes found", nodes.len());
            }
            Ok(())
        }
        ScanState::Error { message } => Err(CliError::Api { status: 0, message }),
        // Idle here means the scan cache was cleared mid-poll.
        other => {
            print_scan_state(device, &other, global);
            Ok(())
        }
    }
}

fn print_scan_state(device: &Device, state: &ScanState, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    match state {
        ScanState::Idle => eprintln!("'{}': no scan has run", device.name),
        ScanState::Scanning => eprintln!("'{}': scan in progress", device.name),
        ScanState::Complete { nodes } => {
            eprintln!("'{}': scan complete, {} nodes", device.name, nodes.len());
        }
        ScanState::Error { message } => eprintln!("'{}': scan failed: {message}", device.name),
    }
}
