// ── Merged tag row — the console's central derived entity ──

use std::fmt;

use serde::Serialize;

/// Composite identity of a tag row: node identity is only unique within a
/// device, so selection and deduplication always key on both parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey {
    pub device_id: i64,
    pub node_id: String,
}

impl TagKey {
    pub fn new(device_id: i64, node_id: impl Into<String>) -> Self {
        Self {
            device_id,
            node_id: node_id.into(),
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device_id, self.node_id)
    }
}

/// One row of the unified tag table: a node observed in a device's latest
/// scan, in its saved-tag list, or both.
///
/// Discovery fields (display name, path, data type) come from the scan when
/// available; editable fields (measurement name, scan class, enabled) come
/// from the saved tag when one exists. `is_collected` is the discriminant:
/// `saved_tag_id` is `Some` iff it is `true`.
///
/// Invariant: within one build, exactly one row exists per
/// (`device_id`, `node_id`) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedTagRow {
    pub device_id: i64,
    pub device_name: String,
    pub node_id: String,
    pub namespace: u16,
    pub identifier: String,
    pub identifier_type: String,
    pub display_name: String,
    pub path: String,
    pub data_type: String,
    pub is_collected: bool,
    pub saved_tag_id: Option<i64>,
    pub measurement_name: String,
    pub scan_class_id: Option<i64>,
    pub scan_class_name: String,
    pub enabled: bool,
}

impl MergedTagRow {
    /// The composite selection/dedup key for this row.
    pub fn key(&self) -> TagKey {
        TagKey::new(self.device_id, self.node_id.clone())
    }

    /// The text wildcard patterns match against: the hierarchical path
    /// when known, else the display name.
    pub fn pattern_target(&self) -> &str {
        if self.path.is_empty() {
            &self.display_name
        } else {
            &self.path
        }
    }

    /// Human-readable address: the path, or the raw node identity when the
    /// path is unknown (saved tags from an old browse session).
    pub fn address(&self) -> String {
        if self.path.is_empty() {
            format!(
                "ns={};{}={}",
                self.namespace, self.identifier_type, self.identifier
            )
        } else {
            self.path.clone()
        }
    }
}
