//! Portal bridge — executes portal requests off the UI loop.
//!
//! Runs as a background task: receives request [`Action`]s from the app
//! loop, performs the HTTP calls, and sends result actions back. Every
//! bulk mutation is followed by an unconditional snapshot reload
//! (success or partial failure), so the table never drifts from the
//! server's state. Scan watchers live here: one per scanned device,
//! cancelled on terminal state or bridge shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use fluxforge_core::{CoreError, Portal, ScanUpdate, ScanWatcher};

use crate::action::{Action, Notification};

const SCAN_POLL_PERIOD: Duration = Duration::from_secs(2);

/// Spawn the bridge task. Returns the sender the app loop uses to
/// forward portal-request actions.
pub fn spawn(
    portal: Portal,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) -> mpsc::UnboundedSender<Action> {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(portal, action_tx, request_rx, cancel));
    request_tx
}

async fn run(
    portal: Portal,
    action_tx: mpsc::UnboundedSender<Action>,
    mut requests: mpsc::UnboundedReceiver<Action>,
    cancel: CancellationToken,
) {
    let (scan_tx, mut scan_rx) = mpsc::unbounded_channel::<ScanUpdate>();
    let mut watchers: HashMap<i64, ScanWatcher> = HashMap::new();

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(request) = requests.recv() => {
                handle_request(&portal, &action_tx, &scan_tx, &mut watchers, request).await;
            }

            Some(update) = scan_rx.recv() => {
                let terminal = update.state.is_terminal();
                if terminal {
                    // Watcher stops itself on terminal state; drop the handle.
                    watchers.remove(&update.device_id);
                }
                let _ = action_tx.send(Action::ScanUpdated {
                    device_id: update.device_id,
                    state: update.state,
                });
                if terminal {
                    // A finished scan changes the merged table.
                    load_snapshot(&portal, &action_tx).await;
                }
            }
        }
    }

    // Dropping the watchers cancels their polling tasks.
    watchers.clear();
    debug!("portal bridge shut down");
}

#[allow(clippy::too_many_lines, clippy::cognitive_complexity)]
async fn handle_request(
    portal: &Portal,
    action_tx: &mpsc::UnboundedSender<Action>,
    scan_tx: &mpsc::UnboundedSender<ScanUpdate>,
    watchers: &mut HashMap<i64, ScanWatcher>,
    request: Action,
) {
    let client = portal.client();

    match request {
        Action::LoadSnapshot => load_snapshot(portal, action_tx).await,

        Action::LoadMetrics => match client.get_metrics().await {
            Ok(metrics) => {
                let _ = action_tx.send(Action::Connected);
                let _ = action_tx.send(Action::MetricsLoaded(Arc::new(metrics)));
            }
            Err(e) => report(action_tx, "metrics load failed", &e.into()),
        },

        Action::LoadSystemConfig => match client.get_system_config().await {
            Ok(config) => {
                let _ = action_tx.send(Action::Connected);
                let _ = action_tx.send(Action::SystemConfigLoaded(Arc::new(config)));
            }
            Err(e) => report(action_tx, "system config load failed", &e.into()),
        },

        Action::LoadInflux => match client.list_influx_configs().await {
            Ok(configs) => {
                let _ = action_tx.send(Action::InfluxLoaded(Arc::new(configs)));
            }
            Err(e) => report(action_tx, "InfluxDB config load failed", &e.into()),
        },

        Action::LoadTelegraf => match client.get_telegraf_config().await {
            Ok(text) => {
                let _ = action_tx.send(Action::TelegrafLoaded(Arc::new(text)));
            }
            Err(e) => report(action_tx, "Telegraf config load failed", &e.into()),
        },

        Action::StartScan(device_id) => match portal.start_scan(device_id).await {
            Ok(state) => {
                let _ = action_tx.send(Action::ScanUpdated {
                    device_id,
                    state: state.clone(),
                });
                if state.is_scanning() {
                    // Replacing an existing watcher drops (cancels) it, so
                    // at most one poller per device is ever live.
                    watchers.insert(
                        device_id,
                        portal.watch_scan(device_id, SCAN_POLL_PERIOD, scan_tx.clone()),
                    );
                }
            }
            Err(e) => report(action_tx, "scan start failed", &e),
        },

        Action::ClearScan(device_id) => {
            watchers.remove(&device_id);
            match portal.clear_scan(device_id).await {
                Ok(()) => load_snapshot(portal, action_tx).await,
                Err(e) => report(action_tx, "scan clear failed", &e),
            }
        }

        Action::DeleteDevice(device_id) => {
            match client.delete_device(device_id).await {
                Ok(_) => {
                    let _ = action_tx.send(Action::Notify(Notification::success("Device deleted")));
                }
                Err(e) => report(action_tx, "device delete failed", &e.into()),
            }
            load_snapshot(portal, action_tx).await;
        }

        Action::CollectTags(plans) => {
            match portal.add_to_collection(&plans).await {
                Ok(added) => {
                    let _ = action_tx.send(Action::Notify(Notification::success(format!(
                        "Collected {added} tags"
                    ))));
                }
                Err(e) => report(action_tx, "collect failed", &e),
            }
            load_snapshot(portal, action_tx).await;
        }

        Action::AssignScanClass {
            rows,
            scan_class_id,
        } => {
            match portal.bulk_assign_scan_class(&rows, scan_class_id).await {
                Ok(patched) => {
                    let _ = action_tx.send(Action::Notify(Notification::success(format!(
                        "Scan class updated on {patched} tags"
                    ))));
                }
                Err(e) => report(action_tx, "scan class update failed", &e),
            }
            load_snapshot(portal, action_tx).await;
        }

        Action::SetTagsEnabled { rows, enabled } => {
            match portal.bulk_set_enabled(&rows, enabled).await {
                Ok(patched) => {
                    let verb = if enabled { "Enabled" } else { "Disabled" };
                    let _ = action_tx.send(Action::Notify(Notification::success(format!(
                        "{verb} {patched} tags"
                    ))));
                }
                Err(e) => report(action_tx, "enable/disable failed", &e),
            }
            load_snapshot(portal, action_tx).await;
        }

        Action::RemoveTags(rows) => {
            match portal.bulk_remove(&rows).await {
                Ok(removed) => {
                    let _ = action_tx.send(Action::Notify(Notification::success(format!(
                        "Removed {removed} tags"
                    ))));
                }
                Err(e) => report(action_tx, "remove failed", &e),
            }
            load_snapshot(portal, action_tx).await;
        }

        Action::CreateScanClass {
            payload,
            make_default,
        } => {
            match client.create_scan_class(&payload).await {
                Ok(created) => {
                    if make_default {
                        if let Err(e) = client.set_default_scan_class(created.id).await {
                            report(action_tx, "set default failed", &e.into());
                        }
                    }
                    let _ = action_tx.send(Action::Notify(Notification::success(format!(
                        "Scan class '{}' created",
                        created.name
                    ))));
                }
                Err(e) => report(action_tx, "scan class create failed", &e.into()),
            }
            load_snapshot(portal, action_tx).await;
        }

        Action::DeleteScanClass(id) => {
            match client.delete_scan_class(id).await {
                Ok(_) => {
                    let _ =
                        action_tx.send(Action::Notify(Notification::success("Scan class deleted")));
                }
                Err(e) => report(action_tx, "scan class delete failed", &e.into()),
            }
            load_snapshot(portal, action_tx).await;
        }

        Action::SetDefaultScanClass(id) => {
            match client.set_default_scan_class(id).await {
                Ok(_) => {}
                Err(e) => report(action_tx, "set default failed", &e.into()),
            }
            load_snapshot(portal, action_tx).await;
        }

        Action::ClearDefaultScanClass(id) => {
            match client.clear_default_scan_class(id).await {
                Ok(_) => {}
                Err(e) => report(action_tx, "clear default failed", &e.into()),
            }
            load_snapshot(portal, action_tx).await;
        }

        Action::CreateInflux(payload) => {
            match client.create_influx_config(&payload).await {
                Ok(created) => {
                    let _ = action_tx.send(Action::Notify(Notification::success(format!(
                        "InfluxDB target '{}' created",
                        created.name
                    ))));
                }
                Err(e) => report(action_tx, "InfluxDB create failed", &e.into()),
            }
            reload_influx(portal, action_tx).await;
        }

        Action::DeleteInflux(id) => {
            match client.delete_influx_config(id).await {
                Ok(_) => {
                    let _ = action_tx
                        .send(Action::Notify(Notification::success("InfluxDB target deleted")));
                }
                Err(e) => report(action_tx, "InfluxDB delete failed", &e.into()),
            }
            reload_influx(portal, action_tx).await;
        }

        Action::TestInflux(id) => match client.test_influx_config(id).await {
            Ok(result) if result.success => {
                let _ = action_tx.send(Action::Notify(Notification::success(format!(
                    "Connection OK: {}",
                    result.message
                ))));
            }
            Ok(result) => {
                let _ = action_tx.send(Action::Notify(Notification::error(result.message)));
            }
            Err(e) => report(action_tx, "InfluxDB test failed", &e.into()),
        },

        Action::UpdateSystemConfig(update) => match client.update_system_config(&update).await {
            Ok(config) => {
                let _ = action_tx.send(Action::Notify(Notification::success(
                    "System configuration saved",
                )));
                let _ = action_tx.send(Action::SystemConfigLoaded(Arc::new(config)));
            }
            Err(e) => report(action_tx, "system config update failed", &e.into()),
        },

        other => {
            warn!(action = ?other, "portal bridge received a non-request action");
        }
    }
}

async fn load_snapshot(portal: &Portal, action_tx: &mpsc::UnboundedSender<Action>) {
    match portal.load_snapshot().await {
        Ok(snapshot) => {
            let _ = action_tx.send(Action::Connected);
            let _ = action_tx.send(Action::SnapshotLoaded(Arc::new(snapshot)));
        }
        Err(e) => report(action_tx, "snapshot load failed", &e),
    }
}

async fn reload_influx(portal: &Portal, action_tx: &mpsc::UnboundedSender<Action>) {
    match portal.client().list_influx_configs().await {
        Ok(configs) => {
            let _ = action_tx.send(Action::InfluxLoaded(Arc::new(configs)));
        }
        Err(e) => report(action_tx, "InfluxDB config load failed", &e.into()),
    }
}

/// Surface a failure as a toast; transport failures also flip the
/// connection indicator.
fn report(action_tx: &mpsc::UnboundedSender<Action>, context: &str, err: &CoreError) {
    warn!(error = %err, "{context}");
    let message = err
        .detail()
        .map_or_else(|| format!("{context}: {err}"), str::to_owned);
    if err.detail().is_none() {
        let _ = action_tx.send(Action::Disconnected(err.to_string()));
    }
    let _ = action_tx.send(Action::Notify(Notification::error(message)));
}
