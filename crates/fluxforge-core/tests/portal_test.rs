#![allow(clippy::unwrap_used)]
// Integration tests for the Portal facade against a mocked portal API.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fluxforge_api::PortalClient;
use fluxforge_core::{Portal, plan_collection, resolve_scan_class};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Portal) {
    let server = MockServer::start().await;
    let client = PortalClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, Portal::new(Arc::new(client)))
}

fn device_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "endpoint_url": format!("opc.tcp://10.0.0.{id}:4840"),
        "enabled": true,
        "created_at": "2025-03-01T08:00:00",
        "updated_at": "2025-03-01T08:00:00"
    })
}

fn saved_tag_json(id: i64, device_id: i64, node_id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "device_id": device_id,
        "node_id": node_id,
        "namespace": 2,
        "identifier": node_id.trim_start_matches("ns=2;s="),
        "identifier_type": "s",
        "display_name": node_id.trim_start_matches("ns=2;s="),
        "path": "",
        "data_type": "Float",
        "measurement_name": "",
        "scan_class_id": null,
        "scan_class_name": null,
        "enabled": true,
        "created_at": "2025-03-01T08:00:00"
    })
}

fn scan_node_json(node_id: &str, display_name: &str) -> serde_json::Value {
    json!({
        "node_id": node_id,
        "namespace": 2,
        "identifier": node_id.trim_start_matches("ns=2;s="),
        "identifier_type": "s",
        "display_name": display_name,
        "path": format!("Channel1.{display_name}"),
        "is_variable": true,
        "data_type": "Float"
    })
}

fn scan_class_json(id: i64, name: &str, is_default: bool) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "interval_ms": 1000,
        "description": "",
        "is_default": is_default,
        "created_at": "2025-03-01T08:00:00",
        "tag_count": 0
    })
}

// ── Snapshot loading ────────────────────────────────────────────────

#[tokio::test]
async fn test_snapshot_fans_out_and_degrades_scan_errors_to_idle() {
    let (server, portal) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            device_json(1, "Press Line 1"),
            device_json(2, "Boiler"),
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/scan-classes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([scan_class_json(1, "Normal", true)])),
        )
        .mount(&server)
        .await;

    // Device 1: completed scan with N1 and N2, N1 already saved.
    Mock::given(method("GET"))
        .and(path("/api/devices/1/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([saved_tag_json(10, 1, "ns=2;s=N1")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices/1/scan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "complete",
            "nodes": [scan_node_json("ns=2;s=N1", "N1"), scan_node_json("ns=2;s=N2", "N2")],
            "error": null
        })))
        .mount(&server)
        .await;

    // Device 2: scan-status endpoint errors, one saved tag survives.
    Mock::given(method("GET"))
        .and(path("/api/devices/2/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([saved_tag_json(20, 2, "ns=2;s=N3")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices/2/scan"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let snap = portal.load_snapshot().await.unwrap();

    assert_eq!(snap.devices.len(), 2);
    let summary: Vec<_> = snap
        .rows
        .iter()
        .map(|r| (r.device_id, r.node_id.as_str(), r.is_collected))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, "ns=2;s=N1", true),
            (1, "ns=2;s=N2", false),
            (2, "ns=2;s=N3", true),
        ]
    );
    assert_eq!(snap.saved_by_device[&1].len(), 1);
    assert_eq!(snap.saved_by_device[&2].len(), 1);
}

#[tokio::test]
async fn test_snapshot_fails_when_saved_tags_fail() {
    let (server, portal) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([device_json(1, "Press Line 1")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/scan-classes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices/1/tags"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "database unavailable"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices/1/scan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "idle", "nodes": [], "error": null
        })))
        .mount(&server)
        .await;

    let err = portal.load_snapshot().await.unwrap_err();
    assert_eq!(err.detail(), Some("database unavailable"));
}

// ── Bulk add-to-collection ──────────────────────────────────────────

#[tokio::test]
async fn test_bulk_add_persists_the_default_scan_class() {
    let (server, portal) = setup().await;

    // Two uncollected rows on device 1, default scan class "Normal" (id 7),
    // no explicit choice.
    let snap_rows = {
        let mut snap = load_simple_snapshot(&server, &portal).await;
        snap.rows.retain(|r| !r.is_collected);
        snap.rows
    };
    assert_eq!(snap_rows.len(), 2);

    let scan_classes: Vec<fluxforge_core::ScanClass> =
        serde_json::from_value(json!([scan_class_json(7, "Normal", true)])).unwrap();
    let chosen = resolve_scan_class(None, &scan_classes);
    assert_eq!(chosen, Some(7));

    let plans = plan_collection(&snap_rows, &HashMap::new(), chosen);
    assert_eq!(plans.len(), 1);

    Mock::given(method("PUT"))
        .and(path("/api/devices/1/tags"))
        .and(body_partial_json(json!({
            "tags": [
                {"node_id": "ns=2;s=N1", "scan_class_id": 7, "enabled": true},
                {"node_id": "ns=2;s=N2", "scan_class_id": 7, "enabled": true}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "count": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let added = portal.add_to_collection(&plans).await.unwrap();
    assert_eq!(added, 2);
}

/// Loads a snapshot with one device whose scan found N1 and N2, nothing
/// saved yet.
async fn load_simple_snapshot(server: &MockServer, portal: &Portal) -> fluxforge_core::TagSnapshot {
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([device_json(1, "Press Line 1")])),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/scan-classes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([scan_class_json(7, "Normal", true)])),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices/1/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices/1/scan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "complete",
            "nodes": [scan_node_json("ns=2;s=N1", "N1"), scan_node_json("ns=2;s=N2", "N2")],
            "error": null
        })))
        .mount(server)
        .await;

    portal.load_snapshot().await.unwrap()
}

// ── Bulk patch / delete ─────────────────────────────────────────────

#[tokio::test]
async fn test_bulk_enable_patches_each_collected_row() {
    let (server, portal) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/devices/1/tags/10"))
        .and(body_partial_json(json!({"enabled": false})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(saved_tag_json(10, 1, "ns=2;s=N1")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/devices/2/tags/20"))
        .and(body_partial_json(json!({"enabled": false})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(saved_tag_json(20, 2, "ns=2;s=N3")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let rows: Vec<fluxforge_core::MergedTagRow> = vec![
        merged_row(1, "ns=2;s=N1", Some(10)),
        merged_row(2, "ns=2;s=N3", Some(20)),
        // Uncollected rows are skipped, not patched.
        merged_row(1, "ns=2;s=N2", None),
    ];

    let patched = portal.bulk_set_enabled(&rows, false).await.unwrap();
    assert_eq!(patched, 2);
}

#[tokio::test]
async fn test_bulk_remove_surfaces_first_error_after_join() {
    let (server, portal) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/devices/1/tags/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/devices/1/tags/11"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Tag not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let rows = vec![
        merged_row(1, "ns=2;s=N1", Some(10)),
        merged_row(1, "ns=2;s=N2", Some(11)),
    ];

    let err = portal.bulk_remove(&rows).await.unwrap_err();
    assert!(err.is_not_found());
}

fn merged_row(device_id: i64, node_id: &str, saved_tag_id: Option<i64>) -> fluxforge_core::MergedTagRow {
    fluxforge_core::MergedTagRow {
        device_id,
        device_name: format!("Device {device_id}"),
        node_id: node_id.to_owned(),
        namespace: 2,
        identifier: node_id.trim_start_matches("ns=2;s=").to_owned(),
        identifier_type: "s".to_owned(),
        display_name: node_id.trim_start_matches("ns=2;s=").to_owned(),
        path: String::new(),
        data_type: "Float".to_owned(),
        is_collected: saved_tag_id.is_some(),
        saved_tag_id,
        measurement_name: String::new(),
        scan_class_id: None,
        scan_class_name: String::new(),
        enabled: true,
    }
}

// ── Default scan class consistency ──────────────────────────────────

#[tokio::test]
async fn test_set_default_twice_leaves_one_default() {
    let (server, portal) = setup().await;
    let client = portal.client();

    Mock::given(method("POST"))
        .and(path("/api/scan-classes/1/set-default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/scan-classes/2/set-default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    // After both calls the server reports Y (id 2) as the only default.
    Mock::given(method("GET"))
        .and(path("/api/scan-classes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            scan_class_json(1, "X", false),
            scan_class_json(2, "Y", true),
        ])))
        .mount(&server)
        .await;

    client.set_default_scan_class(1).await.unwrap();
    client.set_default_scan_class(2).await.unwrap();

    let classes = client.list_scan_classes().await.unwrap();
    let defaults: Vec<_> = classes.iter().filter(|sc| sc.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].name, "Y");
}
