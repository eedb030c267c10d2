// ── Tag view-model builder ──
//
// Combines per-device scan results and saved tags into one merged row
// collection. Node identity is only unique within a device, so merging
// happens per device and the results are concatenated; rows never
// deduplicate across devices.

use std::collections::{HashMap, HashSet};

use fluxforge_api::types::{Device, OpcuaNode, SavedTag};

use crate::model::MergedTagRow;
use crate::scan::ScanState;

/// Everything known about one device at snapshot time: its saved tags and
/// the outcome of its most recent scan.
#[derive(Debug, Clone)]
pub struct DeviceTagSet {
    pub device: Device,
    pub saved_tags: Vec<SavedTag>,
    pub scan: ScanState,
}

/// Merge per-device scan results and saved tags into the unified row set.
///
/// Per device:
/// - Only a [`ScanState::Complete`] scan contributes discovered nodes; an
///   in-progress, failed, or absent scan contributes none.
/// - Discovered nodes are walked in order, first occurrence of a node id
///   wins (scans can report the same node twice across branches).
/// - Saved tags whose node id did not appear in the scan are appended
///   afterwards, so tags from an older scan session survive.
///
/// Pure function of its inputs; callers rebuild after every mutation
/// instead of patching rows in place.
pub fn build_merged_rows(sets: &[DeviceTagSet]) -> Vec<MergedTagRow> {
    let mut rows = Vec::new();

    for set in sets {
        let saved_by_node: HashMap<&str, &SavedTag> = set
            .saved_tags
            .iter()
            .map(|tag| (tag.node_id.as_str(), tag))
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();

        for node in set.scan.nodes() {
            if !seen.insert(node.node_id.as_str()) {
                continue;
            }
            let saved = saved_by_node.get(node.node_id.as_str()).copied();
            rows.push(row_from_node(&set.device, node, saved));
        }

        for tag in &set.saved_tags {
            if seen.insert(tag.node_id.as_str()) {
                rows.push(row_from_saved(&set.device, tag));
            }
        }
    }

    rows
}

/// Row for a node seen in the latest scan. Discovery fields come from the
/// scan; editable fields come from the saved tag when one exists.
fn row_from_node(device: &Device, node: &OpcuaNode, saved: Option<&SavedTag>) -> MergedTagRow {
    MergedTagRow {
        device_id: device.id,
        device_name: device.name.clone(),
        node_id: node.node_id.clone(),
        namespace: node.namespace,
        identifier: node.identifier.clone(),
        identifier_type: node.identifier_type.clone(),
        display_name: node.display_name.clone(),
        path: node.path.clone(),
        data_type: node.data_type.clone(),
        is_collected: saved.is_some(),
        saved_tag_id: saved.map(|tag| tag.id),
        measurement_name: saved
            .map(|tag| tag.measurement_name.clone())
            .unwrap_or_default(),
        scan_class_id: saved.and_then(|tag| tag.scan_class_id),
        scan_class_name: saved
            .and_then(|tag| tag.scan_class_name.clone())
            .unwrap_or_default(),
        enabled: saved.is_some_and(|tag| tag.enabled),
    }
}

/// Row for a saved tag absent from the latest scan.
fn row_from_saved(device: &Device, tag: &SavedTag) -> MergedTagRow {
    MergedTagRow {
        device_id: device.id,
        device_name: device.name.clone(),
        node_id: tag.node_id.clone(),
        namespace: tag.namespace,
        identifier: tag.identifier.clone(),
        identifier_type: tag.identifier_type.clone(),
        display_name: tag.display_name.clone(),
        path: tag.path.clone(),
        data_type: tag.data_type.clone(),
        is_collected: true,
        saved_tag_id: Some(tag.id),
        measurement_name: tag.measurement_name.clone(),
        scan_class_id: tag.scan_class_id,
        scan_class_name: tag.scan_class_name.clone().unwrap_or_default(),
        enabled: tag.enabled,
    }
}

// ── Test fixtures shared across the crate's unit tests ───────────────

#[cfg(test)]
pub(crate) mod tests_support {
    use chrono::NaiveDateTime;

    use fluxforge_api::types::{Device, OpcuaNode, SavedTag, ScanClass};

    use crate::model::MergedTagRow;

    pub(crate) fn device(id: i64, name: &str) -> Device {
        Device {
            id,
            name: name.to_owned(),
            endpoint_url: format!("opc.tcp://10.0.0.{id}:4840"),
            username: String::new(),
            password: String::new(),
            security_policy: "None".to_owned(),
            influxdb_config_id: None,
            enabled: true,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
            tag_count: 0,
            enabled_tag_count: 0,
            influxdb_name: None,
        }
    }

    pub(crate) fn node(node_id: &str, display_name: &str) -> OpcuaNode {
        OpcuaNode {
            node_id: node_id.to_owned(),
            namespace: 2,
            identifier: node_id.trim_start_matches("ns=2;s=").to_owned(),
            identifier_type: "s".to_owned(),
            display_name: display_name.to_owned(),
            browse_name: format!("2:{display_name}"),
            path: String::new(),
            node_class: "Variable".to_owned(),
            is_variable: true,
            has_children: false,
            data_type: "Float".to_owned(),
        }
    }

    pub(crate) fn saved(id: i64, device_id: i64, node_id: &str) -> SavedTag {
        SavedTag {
            id,
            device_id,
            node_id: node_id.to_owned(),
            namespace: 2,
            identifier: node_id.trim_start_matches("ns=2;s=").to_owned(),
            identifier_type: "s".to_owned(),
            display_name: node_id.trim_start_matches("ns=2;s=").to_owned(),
            path: String::new(),
            data_type: "Float".to_owned(),
            measurement_name: String::new(),
            scan_class_id: None,
            scan_class_name: None,
            enabled: true,
            created_at: NaiveDateTime::default(),
        }
    }

    pub(crate) fn scan_class(id: i64, name: &str, is_default: bool) -> ScanClass {
        ScanClass {
            id,
            name: name.to_owned(),
            interval_ms: 1000,
            description: String::new(),
            is_default,
            created_at: NaiveDateTime::default(),
            tag_count: 0,
        }
    }

    pub(crate) fn row(device_id: i64, node_id: &str) -> MergedTagRow {
        MergedTagRow {
            device_id,
            device_name: format!("Device {device_id}"),
            node_id: node_id.to_owned(),
            namespace: 2,
            identifier: node_id.trim_start_matches("ns=2;s=").to_owned(),
            identifier_type: "s".to_owned(),
            display_name: node_id.trim_start_matches("ns=2;s=").to_owned(),
            path: String::new(),
            data_type: "Float".to_owned(),
            is_collected: false,
            saved_tag_id: None,
            measurement_name: String::new(),
            scan_class_id: None,
            scan_class_name: String::new(),
            enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::tests_support::{device, node, saved};
    use super::*;

    fn complete(nodes: Vec<OpcuaNode>) -> ScanState {
        ScanState::Complete { nodes }
    }

    #[test]
    fn merge_is_pure_and_idempotent() {
        let sets = vec![DeviceTagSet {
            device: device(1, "Press Line 1"),
            saved_tags: vec![saved(10, 1, "ns=2;s=A")],
            scan: complete(vec![node("ns=2;s=A", "A"), node("ns=2;s=B", "B")]),
        }];

        let first = build_merged_rows(&sets);
        let second = build_merged_rows(&sets);
        assert_eq!(first, second);
    }

    #[test]
    fn repeated_scan_entries_collapse_to_one_row() {
        let sets = vec![DeviceTagSet {
            device: device(1, "Press Line 1"),
            saved_tags: Vec::new(),
            scan: complete(vec![
                node("ns=2;s=A", "A"),
                node("ns=2;s=A", "A duplicate"),
                node("ns=2;s=B", "B"),
            ]),
        }];

        let rows = build_merged_rows(&sets);
        assert_eq!(rows.len(), 2);
        // First occurrence wins.
        assert_eq!(rows[0].display_name, "A");
    }

    #[test]
    fn saved_tag_missing_from_scan_still_appears_once() {
        let sets = vec![DeviceTagSet {
            device: device(1, "Press Line 1"),
            saved_tags: vec![saved(10, 1, "ns=2;s=Old")],
            scan: complete(vec![node("ns=2;s=New", "New")]),
        }];

        let rows = build_merged_rows(&sets);
        let old: Vec<_> = rows.iter().filter(|r| r.node_id == "ns=2;s=Old").collect();
        assert_eq!(old.len(), 1);
        assert!(old[0].is_collected);
        assert_eq!(old[0].saved_tag_id, Some(10));
    }

    #[test]
    fn incomplete_scan_contributes_no_nodes() {
        for scan in [
            ScanState::Idle,
            ScanState::Scanning,
            ScanState::Error {
                message: "endpoint unreachable".to_owned(),
            },
        ] {
            let sets = vec![DeviceTagSet {
                device: device(1, "Press Line 1"),
                saved_tags: vec![saved(10, 1, "ns=2;s=A")],
                scan,
            }];
            let rows = build_merged_rows(&sets);
            assert_eq!(rows.len(), 1, "only the saved tag should survive");
            assert!(rows[0].is_collected);
        }
    }

    #[test]
    fn composite_key_is_unique_across_the_result() {
        let sets = vec![
            DeviceTagSet {
                device: device(1, "Press Line 1"),
                saved_tags: vec![saved(10, 1, "ns=2;s=A"), saved(11, 1, "ns=2;s=C")],
                scan: complete(vec![
                    node("ns=2;s=A", "A"),
                    node("ns=2;s=A", "A again"),
                    node("ns=2;s=B", "B"),
                ]),
            },
            DeviceTagSet {
                device: device(2, "Boiler"),
                saved_tags: vec![saved(20, 2, "ns=2;s=A")],
                scan: complete(vec![node("ns=2;s=A", "A")]),
            },
        ];

        let rows = build_merged_rows(&sets);
        let keys: HashSet<_> = rows.iter().map(MergedTagRow::key).collect();
        assert_eq!(keys.len(), rows.len());
        // Same node id on two devices is two distinct rows.
        assert_eq!(rows.iter().filter(|r| r.node_id == "ns=2;s=A").count(), 2);
    }

    #[test]
    fn saved_fields_win_for_editable_attributes() {
        let mut tag = saved(10, 1, "ns=2;s=A");
        tag.measurement_name = "boiler_temp".to_owned();
        tag.scan_class_id = Some(3);
        tag.scan_class_name = Some("Fast".to_owned());
        tag.enabled = false;

        let sets = vec![DeviceTagSet {
            device: device(1, "Press Line 1"),
            saved_tags: vec![tag],
            scan: complete(vec![node("ns=2;s=A", "Temperature")]),
        }];

        let rows = build_merged_rows(&sets);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        // Discovery metadata from the scan.
        assert_eq!(row.display_name, "Temperature");
        // Editable attributes from the saved record.
        assert_eq!(row.measurement_name, "boiler_temp");
        assert_eq!(row.scan_class_id, Some(3));
        assert_eq!(row.scan_class_name, "Fast");
        assert!(!row.enabled);
        assert!(row.is_collected);
    }

    #[test]
    fn two_device_scenario() {
        // Device A: completed scan [N1, N2], saved tag for N1.
        // Device B: no scan, saved tag N3.
        let sets = vec![
            DeviceTagSet {
                device: device(1, "A"),
                saved_tags: vec![saved(10, 1, "ns=2;s=N1")],
                scan: complete(vec![node("ns=2;s=N1", "N1"), node("ns=2;s=N2", "N2")]),
            },
            DeviceTagSet {
                device: device(2, "B"),
                saved_tags: vec![saved(20, 2, "ns=2;s=N3")],
                scan: ScanState::Idle,
            },
        ];

        let rows = build_merged_rows(&sets);
        assert_eq!(rows.len(), 3);

        let collected: Vec<_> = rows
            .iter()
            .map(|r| (r.device_id, r.node_id.as_str(), r.is_collected))
            .collect();
        assert_eq!(
            collected,
            vec![
                (1, "ns=2;s=N1", true),
                (1, "ns=2;s=N2", false),
                (2, "ns=2;s=N3", true),
            ]
        );
    }
}
