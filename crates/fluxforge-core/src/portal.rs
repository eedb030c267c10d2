// ── Portal facade ──
//
// Executes snapshot loads and bulk actions against the API client. The
// snapshot is always rebuilt wholesale after a mutation; nothing here
// patches client state incrementally, so there is no store to keep
// consistent and no locking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, try_join_all};
use tokio::sync::mpsc;
use tracing::debug;

use fluxforge_api::PortalClient;
use fluxforge_api::types::{Device, SavedTag, ScanClass, TagPatch};

use crate::error::CoreError;
use crate::merge::{DeviceTagSet, build_merged_rows};
use crate::model::MergedTagRow;
use crate::scan::{ScanState, ScanUpdate, ScanWatcher};
use crate::selection::CollectPlan;

// ── Snapshot ─────────────────────────────────────────────────────────

/// One wholesale load of everything the tag table needs: devices, scan
/// classes, the merged row set, and the raw saved tags per device (the
/// latter feed bulk add-to-collection planning).
#[derive(Debug, Clone, Default)]
pub struct TagSnapshot {
    pub devices: Vec<Device>,
    pub scan_classes: Vec<ScanClass>,
    pub rows: Vec<MergedTagRow>,
    pub saved_by_device: HashMap<i64, Vec<SavedTag>>,
}

impl TagSnapshot {
    /// The scan class currently flagged as default, if any.
    pub fn default_scan_class(&self) -> Option<&ScanClass> {
        self.scan_classes.iter().find(|sc| sc.is_default)
    }

    pub fn device_name(&self, device_id: i64) -> Option<&str> {
        self.devices
            .iter()
            .find(|d| d.id == device_id)
            .map(|d| d.name.as_str())
    }

    /// Distinct namespaces across all rows, ascending. Feeds the
    /// namespace filter choices.
    pub fn namespaces(&self) -> Vec<u16> {
        let mut out: Vec<u16> = self.rows.iter().map(|r| r.namespace).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Distinct non-empty data types across all rows, ascending.
    pub fn data_types(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .rows
            .iter()
            .filter(|r| !r.data_type.is_empty())
            .map(|r| r.data_type.clone())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn collected_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_collected).count()
    }

    pub fn enabled_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.is_collected && r.enabled)
            .count()
    }
}

// ── Portal ───────────────────────────────────────────────────────────

/// High-level console operations on top of [`PortalClient`].
///
/// Cheap to clone; the underlying HTTP client is shared.
#[derive(Clone)]
pub struct Portal {
    client: Arc<PortalClient>,
}

impl Portal {
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }

    /// The shared API client, for operations outside the tag table.
    pub fn client(&self) -> &Arc<PortalClient> {
        &self.client
    }

    // ── Snapshot loading ─────────────────────────────────────────────

    /// Fetch everything and rebuild the merged view from scratch.
    ///
    /// Devices and scan classes load concurrently, then every device's
    /// saved tags and scan status fan out in parallel and join before
    /// merging. A failed scan-status fetch degrades to [`ScanState::Idle`]
    /// (that device simply contributes no discovered nodes); a failed
    /// saved-tags fetch fails the whole load.
    pub async fn load_snapshot(&self) -> Result<TagSnapshot, CoreError> {
        let (devices, scan_classes) = tokio::try_join!(
            self.client.list_devices(),
            self.client.list_scan_classes()
        )?;

        let sets = try_join_all(devices.iter().map(|device| self.fetch_device_set(device)))
            .await?;

        let saved_by_device = sets
            .iter()
            .map(|set| (set.device.id, set.saved_tags.clone()))
            .collect();
        let rows = build_merged_rows(&sets);

        debug!(
            devices = devices.len(),
            rows = rows.len(),
            "tag snapshot rebuilt"
        );

        Ok(TagSnapshot {
            devices,
            scan_classes,
            rows,
            saved_by_device,
        })
    }

    async fn fetch_device_set(&self, device: &Device) -> Result<DeviceTagSet, CoreError> {
        let (tags, status) = tokio::join!(
            self.client.list_device_tags(device.id),
            self.client.get_scan_status(device.id),
        );

        let scan = match status {
            Ok(status) => ScanState::from(status),
            Err(e) => {
                debug!(device_id = device.id, error = %e, "scan status unavailable, treating as idle");
                ScanState::Idle
            }
        };

        Ok(DeviceTagSet {
            device: device.clone(),
            saved_tags: tags?,
            scan,
        })
    }

    // ── Bulk actions ─────────────────────────────────────────────────
    //
    // Each issues its per-row or per-device calls concurrently and joins
    // them all before returning. On partial failure the first error is
    // surfaced after the join; callers clear their selection and reload
    // the snapshot either way, so the table reflects whatever state the
    // server reached.

    /// Submit one replace-all tag save per planned device. Returns the
    /// number of newly collected tags.
    pub async fn add_to_collection(&self, plans: &[CollectPlan]) -> Result<usize, CoreError> {
        let results = join_all(
            plans
                .iter()
                .map(|plan| self.client.save_device_tags(plan.device_id, &plan.tags)),
        )
        .await;

        match results.into_iter().find_map(Result::err) {
            Some(err) => Err(err.into()),
            None => Ok(plans.iter().map(|plan| plan.added).sum()),
        }
    }

    /// Reassign the scan class of every collected row, one PATCH per row.
    pub async fn bulk_assign_scan_class(
        &self,
        rows: &[MergedTagRow],
        scan_class_id: Option<i64>,
    ) -> Result<usize, CoreError> {
        let patch = TagPatch::scan_class(scan_class_id);
        let results = join_all(rows.iter().filter_map(|row| {
            let tag_id = row.saved_tag_id?;
            Some(self.client.patch_tag(row.device_id, tag_id, &patch))
        }))
        .await;
        collect_outcome(results)
    }

    /// Enable or disable every collected row, one PATCH per row.
    pub async fn bulk_set_enabled(
        &self,
        rows: &[MergedTagRow],
        enabled: bool,
    ) -> Result<usize, CoreError> {
        let patch = TagPatch::enable(enabled);
        let results = join_all(rows.iter().filter_map(|row| {
            let tag_id = row.saved_tag_id?;
            Some(self.client.patch_tag(row.device_id, tag_id, &patch))
        }))
        .await;
        collect_outcome(results)
    }

    /// Remove every collected row from the collection, one DELETE per row.
    pub async fn bulk_remove(&self, rows: &[MergedTagRow]) -> Result<usize, CoreError> {
        let results = join_all(rows.iter().filter_map(|row| {
            let tag_id = row.saved_tag_id?;
            Some(self.client.delete_tag(row.device_id, tag_id))
        }))
        .await;
        collect_outcome(results)
    }

    // ── Scan control ─────────────────────────────────────────────────

    pub async fn start_scan(&self, device_id: i64) -> Result<ScanState, CoreError> {
        Ok(self.client.start_scan(device_id).await?.into())
    }

    pub async fn scan_status(&self, device_id: i64) -> Result<ScanState, CoreError> {
        Ok(self.client.get_scan_status(device_id).await?.into())
    }

    pub async fn clear_scan(&self, device_id: i64) -> Result<(), CoreError> {
        self.client.clear_scan(device_id).await?;
        Ok(())
    }

    /// Spawn a polling watcher for one device's scan. The caller owns the
    /// returned handle; dropping it cancels the polling task.
    pub fn watch_scan(
        &self,
        device_id: i64,
        period: Duration,
        updates: mpsc::UnboundedSender<ScanUpdate>,
    ) -> ScanWatcher {
        ScanWatcher::spawn(Arc::clone(&self.client), device_id, period, updates)
    }
}

/// Number of successful calls, or the first error once all calls joined.
fn collect_outcome<T>(results: Vec<Result<T, fluxforge_api::Error>>) -> Result<usize, CoreError> {
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    match results.into_iter().find_map(Result::err) {
        Some(err) => Err(err.into()),
        None => Ok(succeeded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests_support::{device, row, scan_class};

    fn snapshot() -> TagSnapshot {
        let mut a = row(1, "ns=2;s=A");
        a.is_collected = true;
        a.saved_tag_id = Some(10);
        a.enabled = true;
        a.data_type = "Float".to_owned();
        let mut b = row(1, "ns=4;s=B");
        b.namespace = 4;
        b.data_type = String::new();

        TagSnapshot {
            devices: vec![device(1, "Press Line 1")],
            scan_classes: vec![scan_class(1, "Fast", false), scan_class(2, "Normal", true)],
            rows: vec![a, b],
            saved_by_device: HashMap::new(),
        }
    }

    #[test]
    fn snapshot_accessors() {
        let snap = snapshot();

        assert_eq!(snap.default_scan_class().map(|sc| sc.id), Some(2));
        assert_eq!(snap.device_name(1), Some("Press Line 1"));
        assert_eq!(snap.device_name(9), None);
        assert_eq!(snap.namespaces(), vec![2, 4]);
        assert_eq!(snap.data_types(), vec!["Float".to_owned()]);
        assert_eq!(snap.collected_count(), 1);
        assert_eq!(snap.enabled_count(), 1);
    }
}
