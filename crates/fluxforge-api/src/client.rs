// Hand-crafted async HTTP client for the FluxForge portal REST API.
//
// Base path: /api/
// Auth: none — the portal is deployed behind the operator's network boundary.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::types;

// ── Error response shape from the portal ─────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<String>,
}

// ── Transport configuration ──────────────────────────────────────────

/// Connection tuning for a [`PortalClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Accept self-signed TLS certificates.
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the FluxForge portal API.
///
/// One method per backend operation; every call is a fresh request —
/// no retries, no caching.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PortalClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for the portal at `base_url`.
    pub fn new(base_url: &str, config: &ClientConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
        })
    }

    /// Build the base URL so it always ends with `/api/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }
        Ok(url)
    }

    /// The resolved base URL (always ends with `/api/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"devices/3/tags"`) onto the base URL.
    fn url(&self, path: &str) -> Url {
        // base_url always ends with `/api/`, so joining relative paths works.
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn get_text(&self, path: &str) -> Result<String, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.text().await?)
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    /// POST with no request body (scan start, default toggles, tests by id).
    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn post_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url} params={params:?}");

        let resp = self.http.post(url).query(params).send().await?;
        Self::handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview = &body[..body.len().min(200)];
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let detail = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        Error::Api {
            status: status.as_u16(),
            detail,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── System config ────────────────────────────────────────────────

    pub async fn get_system_config(&self) -> Result<types::SystemConfig, Error> {
        self.get("system/config").await
    }

    pub async fn update_system_config(
        &self,
        body: &types::SystemConfigUpdate,
    ) -> Result<types::SystemConfig, Error> {
        self.put("system/config", body).await
    }

    pub async fn test_system_influxdb(&self) -> Result<types::ConnectionTest, Error> {
        self.post_empty("system/config/test-influxdb").await
    }

    // ── Metrics ──────────────────────────────────────────────────────

    pub async fn get_metrics(&self) -> Result<types::Metrics, Error> {
        self.get("metrics").await
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn list_devices(&self) -> Result<Vec<types::Device>, Error> {
        self.get("devices").await
    }

    pub async fn get_device(&self, device_id: i64) -> Result<types::Device, Error> {
        self.get(&format!("devices/{device_id}")).await
    }

    pub async fn create_device(&self, body: &types::DevicePayload) -> Result<types::Device, Error> {
        self.post("devices", body).await
    }

    pub async fn update_device(
        &self,
        device_id: i64,
        body: &types::DevicePayload,
    ) -> Result<types::Device, Error> {
        self.put(&format!("devices/{device_id}"), body).await
    }

    pub async fn delete_device(&self, device_id: i64) -> Result<types::Ack, Error> {
        self.delete(&format!("devices/{device_id}")).await
    }

    pub async fn test_device_connection(
        &self,
        device_id: i64,
    ) -> Result<types::ConnectionTest, Error> {
        self.post_empty(&format!("devices/{device_id}/test-connection"))
            .await
    }

    pub async fn test_device_connection_raw(
        &self,
        body: &types::OpcuaTestPayload,
    ) -> Result<types::ConnectionTest, Error> {
        self.post("devices/test-connection", body).await
    }

    // ── Browse / scan ────────────────────────────────────────────────

    /// Browse one level of the device's address space. `node_id = None`
    /// browses the Objects root.
    pub async fn browse_node(
        &self,
        device_id: i64,
        node_id: Option<&str>,
    ) -> Result<types::BrowseResult, Error> {
        let path = format!("devices/{device_id}/browse");
        match node_id {
            Some(node_id) => {
                self.post_with_params(&path, &[("node_id", node_id.to_owned())])
                    .await
            }
            None => self.post_empty(&path).await,
        }
    }

    pub async fn start_scan(&self, device_id: i64) -> Result<types::ScanStatus, Error> {
        self.post_empty(&format!("devices/{device_id}/scan")).await
    }

    pub async fn get_scan_status(&self, device_id: i64) -> Result<types::ScanStatus, Error> {
        self.get(&format!("devices/{device_id}/scan")).await
    }

    pub async fn clear_scan(&self, device_id: i64) -> Result<types::Ack, Error> {
        self.delete(&format!("devices/{device_id}/scan")).await
    }

    // ── Tags ─────────────────────────────────────────────────────────

    pub async fn list_device_tags(&self, device_id: i64) -> Result<Vec<types::SavedTag>, Error> {
        self.get(&format!("devices/{device_id}/tags")).await
    }

    /// Replace all tags for a device with the provided list.
    pub async fn save_device_tags(
        &self,
        device_id: i64,
        tags: &[types::TagCreate],
    ) -> Result<types::SaveResult, Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            tags: &'a [types::TagCreate],
        }

        self.put(&format!("devices/{device_id}/tags"), &Body { tags })
            .await
    }

    pub async fn patch_tag(
        &self,
        device_id: i64,
        tag_id: i64,
        body: &types::TagPatch,
    ) -> Result<types::SavedTag, Error> {
        self.patch(&format!("devices/{device_id}/tags/{tag_id}"), body)
            .await
    }

    pub async fn delete_tag(&self, device_id: i64, tag_id: i64) -> Result<types::Ack, Error> {
        self.delete(&format!("devices/{device_id}/tags/{tag_id}"))
            .await
    }

    // ── Scan classes ─────────────────────────────────────────────────

    pub async fn list_scan_classes(&self) -> Result<Vec<types::ScanClass>, Error> {
        self.get("scan-classes").await
    }

    pub async fn create_scan_class(
        &self,
        body: &types::ScanClassPayload,
    ) -> Result<types::ScanClass, Error> {
        self.post("scan-classes", body).await
    }

    pub async fn update_scan_class(
        &self,
        scan_class_id: i64,
        body: &types::ScanClassPayload,
    ) -> Result<types::ScanClass, Error> {
        self.put(&format!("scan-classes/{scan_class_id}"), body)
            .await
    }

    pub async fn delete_scan_class(&self, scan_class_id: i64) -> Result<types::Ack, Error> {
        self.delete(&format!("scan-classes/{scan_class_id}")).await
    }

    pub async fn set_default_scan_class(&self, scan_class_id: i64) -> Result<types::Ack, Error> {
        self.post_empty(&format!("scan-classes/{scan_class_id}/set-default"))
            .await
    }

    pub async fn clear_default_scan_class(&self, scan_class_id: i64) -> Result<types::Ack, Error> {
        self.post_empty(&format!("scan-classes/{scan_class_id}/clear-default"))
            .await
    }

    // ── InfluxDB configs ─────────────────────────────────────────────

    pub async fn list_influx_configs(&self) -> Result<Vec<types::InfluxConfig>, Error> {
        self.get("influxdb").await
    }

    pub async fn create_influx_config(
        &self,
        body: &types::InfluxConfigPayload,
    ) -> Result<types::InfluxConfig, Error> {
        self.post("influxdb", body).await
    }

    pub async fn update_influx_config(
        &self,
        config_id: i64,
        body: &types::InfluxConfigPayload,
    ) -> Result<types::InfluxConfig, Error> {
        self.put(&format!("influxdb/{config_id}"), body).await
    }

    pub async fn delete_influx_config(&self, config_id: i64) -> Result<types::Ack, Error> {
        self.delete(&format!("influxdb/{config_id}")).await
    }

    pub async fn test_influx_config(&self, config_id: i64) -> Result<types::ConnectionTest, Error> {
        self.post_empty(&format!("influxdb/{config_id}/test")).await
    }

    pub async fn test_influx_connection_raw(
        &self,
        body: &types::InfluxTestPayload,
    ) -> Result<types::ConnectionTest, Error> {
        self.post("influxdb/test-connection", body).await
    }

    pub async fn list_influx_buckets(&self, config_id: i64) -> Result<types::Buckets, Error> {
        self.get(&format!("influxdb/{config_id}/buckets")).await
    }

    // ── Telegraf ─────────────────────────────────────────────────────

    /// The generated Telegraf configuration as plain text.
    pub async fn get_telegraf_config(&self) -> Result<String, Error> {
        self.get_text("telegraf/config").await
    }

    /// Same content, served by the attachment endpoint.
    pub async fn download_telegraf_config(&self) -> Result<String, Error> {
        self.get_text("telegraf/config/download").await
    }
}
