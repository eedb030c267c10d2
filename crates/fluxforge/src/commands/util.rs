//! Shared helpers for command handlers.

use fluxforge_api::types::Device;
use fluxforge_core::{CollectionView, FilterCriteria, Portal, ScanClassFilter, TagSnapshot};

use crate::cli::{TagFilterArgs, TagView};
use crate::error::CliError;

/// Resolve a device identifier (numeric ID or name) to the device record.
pub async fn resolve_device(portal: &Portal, identifier: &str) -> Result<Device, CliError> {
    let devices = portal.client().list_devices().await?;
    let found = devices
        .into_iter()
        .find(|d| d.id.to_string() == identifier || d.name == identifier);
    found.ok_or_else(|| CliError::NotFound {
        resource_type: "device".into(),
        identifier: identifier.into(),
        list_command: "devices list".into(),
    })
}

/// Translate `TagFilterArgs` (+ optional view) into core filter criteria.
///
/// The `--device` flag accepts an ID or a name, so resolution happens
/// against the loaded snapshot.
pub fn build_criteria(
    filter: &TagFilterArgs,
    view: Option<TagView>,
    snapshot: &TagSnapshot,
) -> Result<FilterCriteria, CliError> {
    let device_id = match &filter.device {
        None => None,
        Some(ident) => {
            let found = snapshot
                .devices
                .iter()
                .find(|d| d.id.to_string() == *ident || d.name == *ident);
            Some(
                found
                    .map(|d| d.id)
                    .ok_or_else(|| CliError::NotFound {
                        resource_type: "device".into(),
                        identifier: ident.clone(),
                        list_command: "devices list".into(),
                    })?,
            )
        }
    };

    let scan_class = if filter.unassigned {
        Some(ScanClassFilter::Unassigned)
    } else {
        filter.scan_class.map(ScanClassFilter::Class)
    };

    Ok(FilterCriteria {
        view: match view {
            Some(TagView::Collected) => CollectionView::Collected,
            Some(TagView::Available) => CollectionView::Available,
            Some(TagView::All) | None => CollectionView::All,
        },
        search: filter.search.clone().unwrap_or_default(),
        wildcard: filter.pattern.clone().unwrap_or_default(),
        device_id,
        scan_class,
        data_type: filter.data_type.clone(),
        enabled: filter.enabled,
        namespace: filter.namespace,
    })
}

/// Ensure a scan class ID exists before issuing per-row calls.
pub fn require_scan_class(snapshot: &TagSnapshot, id: i64) -> Result<(), CliError> {
    if snapshot.scan_classes.iter().any(|sc| sc.id == id) {
        Ok(())
    } else {
        Err(CliError::NotFound {
            resource_type: "scan class".into(),
            identifier: id.to_string(),
            list_command: "scan-classes list".into(),
        })
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
