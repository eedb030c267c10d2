#![allow(clippy::unwrap_used)]
// Integration tests for `PortalClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fluxforge_api::types::{ScanPhase, TagCreate, TagPatch};
use fluxforge_api::{Error, PortalClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PortalClient) {
    let server = MockServer::start().await;
    let client = PortalClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

// ── Base URL handling ───────────────────────────────────────────────

#[tokio::test]
async fn test_base_url_gets_api_suffix() {
    let client = PortalClient::from_reqwest("http://portal.local:8000", reqwest::Client::new())
        .unwrap();
    assert_eq!(client.base_url().as_str(), "http://portal.local:8000/api/");

    // Already-suffixed URLs are left alone
    let client = PortalClient::from_reqwest("http://portal.local:8000/api", reqwest::Client::new())
        .unwrap();
    assert_eq!(client.base_url().as_str(), "http://portal.local:8000/api/");
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices() {
    let (server, client) = setup().await;

    let body = json!([{
        "id": 1,
        "name": "Press Line 1",
        "endpoint_url": "opc.tcp://10.0.0.5:4840",
        "username": "",
        "password": "",
        "security_policy": "None",
        "influxdb_config_id": 2,
        "influxdb_name": "plant-influx",
        "enabled": true,
        "created_at": "2025-03-01T08:00:00",
        "updated_at": "2025-03-02T09:30:00",
        "tag_count": 14,
        "enabled_tag_count": 12
    }]);

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name, "Press Line 1");
    assert_eq!(devices[0].endpoint_url, "opc.tcp://10.0.0.5:4840");
    assert_eq!(devices[0].influxdb_name.as_deref(), Some("plant-influx"));
    assert_eq!(devices[0].tag_count, 14);
}

#[tokio::test]
async fn test_device_not_found_surfaces_detail() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices/99"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Device not found"})),
        )
        .mount(&server)
        .await;

    let err = client.get_device(99).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.detail(), Some("Device not found"));
    match err {
        Error::Api { status, detail } => {
            assert_eq!(status, 404);
            assert_eq!(detail, "Device not found");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_without_json_body_falls_back_to_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.list_devices().await.unwrap_err();

    match err {
        Error::Api { status, detail } => {
            assert_eq!(status, 500);
            assert!(detail.contains("500"), "fallback detail was: {detail}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Browse / scan tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_browse_node_passes_node_id_as_query() {
    let (server, client) = setup().await;

    let body = json!({
        "nodes": [{
            "node_id": "ns=2;s=Channel1.Device1",
            "namespace": 2,
            "identifier": "Channel1.Device1",
            "identifier_type": "s",
            "display_name": "Device1",
            "browse_name": "2:Device1",
            "path": "Channel1.Device1",
            "node_class": "Object",
            "is_variable": false,
            "has_children": true,
            "data_type": ""
        }]
    });

    Mock::given(method("POST"))
        .and(path("/api/devices/1/browse"))
        .and(query_param("node_id", "ns=2;s=Channel1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let result = client
        .browse_node(1, Some("ns=2;s=Channel1"))
        .await
        .unwrap();

    assert_eq!(result.nodes.len(), 1);
    assert!(result.nodes[0].has_children);
    assert!(!result.nodes[0].is_variable);
}

#[tokio::test]
async fn test_scan_lifecycle_statuses() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/devices/1/scan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "scanning",
            "message": "Scan started"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/devices/1/scan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "complete",
            "nodes": [{
                "node_id": "ns=2;s=Channel1.Device1.Temperature",
                "namespace": 2,
                "identifier": "Channel1.Device1.Temperature",
                "identifier_type": "s",
                "display_name": "Temperature",
                "path": "Channel1.Device1.Temperature",
                "is_variable": true,
                "data_type": "Float"
            }],
            "error": null
        })))
        .mount(&server)
        .await;

    let started = client.start_scan(1).await.unwrap();
    assert_eq!(started.status, ScanPhase::Scanning);
    assert_eq!(started.message.as_deref(), Some("Scan started"));

    let status = client.get_scan_status(1).await.unwrap();
    assert_eq!(status.status, ScanPhase::Complete);
    assert_eq!(status.nodes.len(), 1);
    assert_eq!(status.nodes[0].data_type, "Float");
}

#[tokio::test]
async fn test_scan_status_idle_for_unscanned_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices/7/scan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "idle",
            "nodes": [],
            "error": null
        })))
        .mount(&server)
        .await;

    let status = client.get_scan_status(7).await.unwrap();
    assert_eq!(status.status, ScanPhase::Idle);
    assert!(status.nodes.is_empty());
}

// ── Tag tests ───────────────────────────────────────────────────────

fn sample_tag_create(device_id: i64, node_id: &str) -> TagCreate {
    TagCreate {
        device_id,
        node_id: node_id.to_owned(),
        namespace: 2,
        identifier: node_id.trim_start_matches("ns=2;s=").to_owned(),
        identifier_type: "s".to_owned(),
        display_name: "Temperature".to_owned(),
        path: "Channel1.Device1.Temperature".to_owned(),
        data_type: "Float".to_owned(),
        measurement_name: String::new(),
        scan_class_id: Some(1),
        enabled: true,
    }
}

#[tokio::test]
async fn test_save_device_tags_wraps_body_in_tags_key() {
    let (server, client) = setup().await;

    let tags = vec![sample_tag_create(1, "ns=2;s=Channel1.Device1.Temperature")];
    let expected_body = json!({ "tags": serde_json::to_value(&tags).unwrap() });

    Mock::given(method("PUT"))
        .and(path("/api/devices/1/tags"))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "count": 1})))
        .mount(&server)
        .await;

    let result = client.save_device_tags(1, &tags).await.unwrap();
    assert!(result.ok);
    assert_eq!(result.count, 1);
}

#[tokio::test]
async fn test_patch_tag_serializes_only_set_fields() {
    let (server, client) = setup().await;

    // Clearing the scan class must send an explicit null, and nothing else.
    Mock::given(method("PATCH"))
        .and(path("/api/devices/1/tags/42"))
        .and(body_json(json!({"scan_class_id": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "device_id": 1,
            "node_id": "ns=2;s=Channel1.Device1.Temperature",
            "namespace": 2,
            "identifier": "Channel1.Device1.Temperature",
            "identifier_type": "s",
            "display_name": "Temperature",
            "path": "Channel1.Device1.Temperature",
            "data_type": "Float",
            "measurement_name": "",
            "scan_class_id": null,
            "scan_class_name": null,
            "enabled": true,
            "created_at": "2025-03-01T08:00:00"
        })))
        .mount(&server)
        .await;

    let tag = client
        .patch_tag(1, 42, &TagPatch::scan_class(None))
        .await
        .unwrap();

    assert_eq!(tag.id, 42);
    assert_eq!(tag.scan_class_id, None);
}

// ── Scan class tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_set_default_scan_class_posts_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/scan-classes/3/set-default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let ack = client.set_default_scan_class(3).await.unwrap();
    assert!(ack.ok);
}

#[tokio::test]
async fn test_create_scan_class_conflict() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/scan-classes"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Scan class name already exists"})),
        )
        .mount(&server)
        .await;

    let err = client
        .create_scan_class(&fluxforge_api::types::ScanClassPayload {
            name: "Fast".to_owned(),
            interval_ms: 250,
            description: String::new(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.detail(), Some("Scan class name already exists"));
}

// ── Telegraf tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_telegraf_config_returns_plain_text() {
    let (server, client) = setup().await;

    let config = "[agent]\n  interval = \"10s\"\n\n[[inputs.opcua]]\n  name = \"press-line-1\"\n";

    Mock::given(method("GET"))
        .and(path("/api/telegraf/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string(config))
        .mount(&server)
        .await;

    let body = client.get_telegraf_config().await.unwrap();
    assert_eq!(body, config);
}

// ── System config tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_get_system_config() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/system/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "setup_complete": true,
            "influxdb_url": "http://influx:8086",
            "influxdb_token": "t0ken",
            "influxdb_org": "plant",
            "influxdb_default_bucket": "telemetry",
            "telegraf_config_path": "/etc/telegraf/telegraf.conf",
            "telegraf_reload_command": "systemctl reload telegraf",
            "app_title": "FluxForge"
        })))
        .mount(&server)
        .await;

    let config = client.get_system_config().await.unwrap();
    assert!(config.setup_complete);
    assert_eq!(config.app_title, "FluxForge");
}
