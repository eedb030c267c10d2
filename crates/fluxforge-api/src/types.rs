//! Wire types for the FluxForge portal API.
//!
//! Shapes are server-owned; deserialization is lenient (`#[serde(default)]`
//! on fields the server may omit) so the client survives additive changes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ── Devices ──────────────────────────────────────────────────────────

/// A registered OPC UA device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub endpoint_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_security_policy")]
    pub security_policy: String,
    #[serde(default)]
    pub influxdb_config_id: Option<i64>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub tag_count: i64,
    #[serde(default)]
    pub enabled_tag_count: i64,
    #[serde(default)]
    pub influxdb_name: Option<String>,
}

/// Create/update payload for a device.
#[derive(Debug, Clone, Serialize)]
pub struct DevicePayload {
    pub name: String,
    pub endpoint_url: String,
    pub username: String,
    pub password: String,
    pub security_policy: String,
    pub influxdb_config_id: Option<i64>,
    pub enabled: bool,
}

/// Connection-test payload for an unsaved device.
#[derive(Debug, Clone, Serialize)]
pub struct OpcuaTestPayload {
    pub endpoint_url: String,
    pub username: String,
    pub password: String,
    pub security_policy: String,
}

/// Result of an OPC UA or InfluxDB connection test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTest {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

// ── Browse / scan ────────────────────────────────────────────────────

/// A node discovered by browsing or scanning a device's address space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpcuaNode {
    pub node_id: String,
    pub namespace: u16,
    pub identifier: String,
    #[serde(default = "default_identifier_type")]
    pub identifier_type: String,
    pub display_name: String,
    #[serde(default)]
    pub browse_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub node_class: String,
    #[serde(default)]
    pub is_variable: bool,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub data_type: String,
}

/// One level of a browse response.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowseResult {
    pub nodes: Vec<OpcuaNode>,
}

/// Lifecycle phase of a device scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    /// No scan has run (or its cache was cleared).
    #[serde(alias = "none")]
    Idle,
    Scanning,
    Complete,
    Error,
}

/// Server-side scan cache entry for a device.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanStatus {
    pub status: ScanPhase,
    #[serde(default)]
    pub nodes: Vec<OpcuaNode>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ScanStatus {
    /// The status reported for a device with no scan cache entry.
    pub fn idle() -> Self {
        Self {
            status: ScanPhase::Idle,
            nodes: Vec::new(),
            error: None,
            message: None,
        }
    }
}

// ── Tags ─────────────────────────────────────────────────────────────

/// A persisted tag (node selected for collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTag {
    pub id: i64,
    pub device_id: i64,
    pub node_id: String,
    pub namespace: u16,
    pub identifier: String,
    #[serde(default = "default_identifier_type")]
    pub identifier_type: String,
    pub display_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub measurement_name: String,
    #[serde(default)]
    pub scan_class_id: Option<i64>,
    #[serde(default)]
    pub scan_class_name: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub created_at: NaiveDateTime,
}

/// Tag entry for the replace-all save call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCreate {
    pub device_id: i64,
    pub node_id: String,
    pub namespace: u16,
    pub identifier: String,
    pub identifier_type: String,
    pub display_name: String,
    pub path: String,
    pub data_type: String,
    pub measurement_name: String,
    pub scan_class_id: Option<i64>,
    pub enabled: bool,
}

impl From<&SavedTag> for TagCreate {
    fn from(tag: &SavedTag) -> Self {
        Self {
            device_id: tag.device_id,
            node_id: tag.node_id.clone(),
            namespace: tag.namespace,
            identifier: tag.identifier.clone(),
            identifier_type: tag.identifier_type.clone(),
            display_name: tag.display_name.clone(),
            path: tag.path.clone(),
            data_type: tag.data_type.clone(),
            measurement_name: tag.measurement_name.clone(),
            scan_class_id: tag.scan_class_id,
            enabled: tag.enabled,
        }
    }
}

/// Partial update for a saved tag. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TagPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_class_id: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl TagPatch {
    pub fn measurement(name: impl Into<String>) -> Self {
        Self {
            measurement_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn scan_class(id: Option<i64>) -> Self {
        Self {
            scan_class_id: Some(id),
            ..Self::default()
        }
    }

    pub fn enable(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }
}

/// Result of the replace-all tag save.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveResult {
    pub ok: bool,
    #[serde(default)]
    pub count: i64,
}

// ── Scan classes ─────────────────────────────────────────────────────

/// A named polling-interval group assignable to tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanClass {
    pub id: i64,
    pub name: String,
    pub interval_ms: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub tag_count: i64,
}

/// Create/update payload for a scan class.
#[derive(Debug, Clone, Serialize)]
pub struct ScanClassPayload {
    pub name: String,
    pub interval_ms: u64,
    pub description: String,
}

// ── InfluxDB configs ─────────────────────────────────────────────────

/// A stored InfluxDB connection target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub device_count: i64,
}

/// Create/update payload for an InfluxDB config.
#[derive(Debug, Clone, Serialize)]
pub struct InfluxConfigPayload {
    pub name: String,
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub is_default: bool,
}

/// Connection-test payload for an unsaved InfluxDB target.
#[derive(Debug, Clone, Serialize)]
pub struct InfluxTestPayload {
    pub url: String,
    pub token: String,
    pub org: String,
}

/// Bucket listing for a stored InfluxDB config.
#[derive(Debug, Clone, Deserialize)]
pub struct Buckets {
    pub buckets: Vec<String>,
}

// ── System config ────────────────────────────────────────────────────

/// Process-wide portal configuration singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub setup_complete: bool,
    #[serde(default)]
    pub influxdb_url: String,
    #[serde(default)]
    pub influxdb_token: String,
    #[serde(default)]
    pub influxdb_org: String,
    #[serde(default)]
    pub influxdb_default_bucket: String,
    #[serde(default)]
    pub telegraf_config_path: String,
    #[serde(default)]
    pub telegraf_reload_command: String,
    #[serde(default)]
    pub app_title: String,
}

/// Update payload for the system config.
#[derive(Debug, Clone, Serialize)]
pub struct SystemConfigUpdate {
    pub influxdb_url: String,
    pub influxdb_token: String,
    pub influxdb_org: String,
    pub influxdb_default_bucket: String,
    pub telegraf_config_path: String,
    pub telegraf_reload_command: String,
    pub app_title: String,
}

// ── Metrics ──────────────────────────────────────────────────────────

/// Enabled-tag load for one scan class (plus a synthetic "Unassigned" row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanClassLoad {
    pub name: String,
    pub interval_ms: u64,
    pub tag_count: i64,
}

/// Per-device dashboard summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub id: i64,
    pub name: String,
    pub endpoint_url: String,
    pub enabled: bool,
    pub enabled_tag_count: i64,
    #[serde(default)]
    pub influxdb_name: Option<String>,
}

/// Per-InfluxDB-config dashboard summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxSummary {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub is_default: bool,
    pub device_count: i64,
}

/// Dashboard read model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub total_devices: i64,
    pub enabled_devices: i64,
    pub total_tags: i64,
    pub enabled_tags: i64,
    pub scan_class_count: i64,
    pub influxdb_count: i64,
    pub tags_by_scan_class: Vec<ScanClassLoad>,
    pub device_summary: Vec<DeviceSummary>,
    pub influx_summary: Vec<InfluxSummary>,
}

// ── Shared ───────────────────────────────────────────────────────────

/// Generic `{"ok": true}` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

fn default_true() -> bool {
    true
}

fn default_security_policy() -> String {
    "None".to_owned()
}

fn default_identifier_type() -> String {
    "s".to_owned()
}
