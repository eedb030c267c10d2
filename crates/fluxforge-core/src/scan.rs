// ── Per-device scan state machine and status polling ──
//
// A scan runs server-side; the console only observes it. While a scan is
// in flight the owning view runs one ScanWatcher for the device, which
// polls on a fixed interval and stops itself on the first non-scanning
// state. Teardown cancels the watcher so no update outlives its view.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use fluxforge_api::PortalClient;
use fluxforge_api::types::{OpcuaNode, ScanPhase, ScanStatus};

/// Observed state of a device scan: `Idle → Scanning → {Complete | Error}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScanState {
    /// No scan has run, or its cache was cleared.
    #[default]
    Idle,
    Scanning,
    /// Scan finished; carries the discovered variable nodes.
    Complete { nodes: Vec<OpcuaNode> },
    Error { message: String },
}

impl ScanState {
    pub fn is_scanning(&self) -> bool {
        matches!(self, Self::Scanning)
    }

    /// `true` once the state can no longer change without a new scan.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    /// Discovered nodes — empty unless the scan completed.
    pub fn nodes(&self) -> &[OpcuaNode] {
        match self {
            Self::Complete { nodes } => nodes,
            _ => &[],
        }
    }
}

impl From<ScanStatus> for ScanState {
    fn from(status: ScanStatus) -> Self {
        match status.status {
            ScanPhase::Idle => Self::Idle,
            ScanPhase::Scanning => Self::Scanning,
            ScanPhase::Complete => Self::Complete {
                nodes: status.nodes,
            },
            ScanPhase::Error => Self::Error {
                message: status
                    .error
                    .unwrap_or_else(|| "scan failed".to_owned()),
            },
        }
    }
}

/// One observed scan-state change, tagged with its device.
#[derive(Debug)]
pub struct ScanUpdate {
    pub device_id: i64,
    pub state: ScanState,
}

/// Cancellable fixed-interval polling task for one device's scan status.
///
/// The task sends every observed state over the channel and exits on the
/// first state that is not `Scanning`. Dropping the watcher (or calling
/// [`stop`](Self::stop)) cancels the task, so a torn-down view never
/// receives a late update. Owners keep at most one watcher per device;
/// replacing it drops — and therefore cancels — the old one.
pub struct ScanWatcher {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScanWatcher {
    /// Spawn the polling task. The first poll fires immediately.
    pub fn spawn(
        client: Arc<PortalClient>,
        device_id: i64,
        period: Duration,
        updates: mpsc::UnboundedSender<ScanUpdate>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,

                    _ = ticker.tick() => {
                        let state = match client.get_scan_status(device_id).await {
                            Ok(status) => ScanState::from(status),
                            Err(e) => {
                                // Transient fetch failures don't change the
                                // observed state; keep polling.
                                warn!(device_id, error = %e, "scan status poll failed");
                                continue;
                            }
                        };

                        let stop = !state.is_scanning();
                        if updates.send(ScanUpdate { device_id, state }).is_err() {
                            break;
                        }
                        if stop {
                            debug!(device_id, "scan watcher reached terminal state");
                            break;
                        }
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    /// Cancel the polling task.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// `true` once the task has exited (terminal state or cancellation).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScanWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(phase: ScanPhase) -> ScanStatus {
        ScanStatus {
            status: phase,
            nodes: Vec::new(),
            error: None,
            message: None,
        }
    }

    #[test]
    fn terminal_states() {
        assert!(!ScanState::Idle.is_terminal());
        assert!(!ScanState::Scanning.is_terminal());
        assert!(ScanState::Complete { nodes: Vec::new() }.is_terminal());
        assert!(
            ScanState::Error {
                message: "boom".into()
            }
            .is_terminal()
        );
    }

    #[test]
    fn error_state_defaults_message() {
        let state = ScanState::from(status(ScanPhase::Error));
        assert_eq!(
            state,
            ScanState::Error {
                message: "scan failed".into()
            }
        );
    }

    #[test]
    fn nodes_only_for_complete() {
        assert!(ScanState::Scanning.nodes().is_empty());
        let state = ScanState::from(ScanStatus {
            status: ScanPhase::Complete,
            nodes: vec![crate::merge::tests_support::node("ns=2;s=A", "A")],
            error: None,
            message: None,
        });
        assert_eq!(state.nodes().len(), 1);
    }
}
