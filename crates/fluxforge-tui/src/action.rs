//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use fluxforge_api::types::{
    InfluxConfig, InfluxConfigPayload, Metrics, ScanClassPayload, SystemConfig, SystemConfigUpdate,
};
use fluxforge_core::{CollectPlan, MergedTagRow, ScanState, TagSnapshot};

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
///
/// Request variants are forwarded by the app loop to the portal bridge;
/// result variants come back from the bridge and fan out to screens.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,
    ToggleHelp,

    // ── Portal requests ───────────────────────────────────────────
    LoadSnapshot,
    LoadMetrics,
    LoadSystemConfig,
    LoadInflux,
    LoadTelegraf,
    StartScan(i64),
    ClearScan(i64),
    DeleteDevice(i64),
    CollectTags(Vec<CollectPlan>),
    AssignScanClass {
        rows: Vec<MergedTagRow>,
        scan_class_id: Option<i64>,
    },
    SetTagsEnabled {
        rows: Vec<MergedTagRow>,
        enabled: bool,
    },
    RemoveTags(Vec<MergedTagRow>),
    CreateScanClass {
        payload: ScanClassPayload,
        make_default: bool,
    },
    DeleteScanClass(i64),
    SetDefaultScanClass(i64),
    ClearDefaultScanClass(i64),
    CreateInflux(InfluxConfigPayload),
    DeleteInflux(i64),
    TestInflux(i64),
    UpdateSystemConfig(SystemConfigUpdate),

    // ── Portal results ────────────────────────────────────────────
    SnapshotLoaded(Arc<TagSnapshot>),
    MetricsLoaded(Arc<Metrics>),
    SystemConfigLoaded(Arc<SystemConfig>),
    InfluxLoaded(Arc<Vec<InfluxConfig>>),
    TelegrafLoaded(Arc<String>),
    ScanUpdated { device_id: i64, state: ScanState },

    // ── Connection Status ─────────────────────────────────────────
    Connected,
    Disconnected(String),

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}

impl Action {
    /// `true` for actions the app loop forwards to the portal bridge.
    pub fn is_portal_request(&self) -> bool {
        matches!(
            self,
            Self::LoadSnapshot
                | Self::LoadMetrics
                | Self::LoadSystemConfig
                | Self::LoadInflux
                | Self::LoadTelegraf
                | Self::StartScan(_)
                | Self::ClearScan(_)
                | Self::DeleteDevice(_)
                | Self::CollectTags(_)
                | Self::AssignScanClass { .. }
                | Self::SetTagsEnabled { .. }
                | Self::RemoveTags(_)
                | Self::CreateScanClass { .. }
                | Self::DeleteScanClass(_)
                | Self::SetDefaultScanClass(_)
                | Self::ClearDefaultScanClass(_)
                | Self::CreateInflux(_)
                | Self::DeleteInflux(_)
                | Self::TestInflux(_)
                | Self::UpdateSystemConfig(_)
        )
    }
}
