//! Tag command handlers.
//!
//! Every command loads a fresh snapshot, selects its working set through
//! the core filter engine, and (for mutations) re-checks nothing locally
//! afterwards — the next invocation reloads from the server.

use tabled::Tabled;

use fluxforge_core::{
    GroupKey, MergedTagRow, Portal, SortDirection, SortKey, filter_rows, group_rows,
    plan_collection, resolve_scan_class, sort_rows,
};

use crate::cli::{GlobalOpts, TagGroupBy, TagSortColumn, TagsArgs, TagsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TagRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Tag Name")]
    name: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "NS")]
    namespace: u16,
    #[tabled(rename = "Type")]
    data_type: String,
    #[tabled(rename = "Measurement")]
    measurement: String,
    #[tabled(rename = "Scan Class")]
    scan_class: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

impl From<&MergedTagRow> for TagRow {
    fn from(row: &MergedTagRow) -> Self {
        Self {
            status: if row.is_collected {
                "collected"
            } else {
                "available"
            }
            .into(),
            device: row.device_name.clone(),
            name: row.display_name.clone(),
            path: row.address(),
            namespace: row.namespace,
            data_type: if row.data_type.is_empty() {
                "-".into()
            } else {
                row.data_type.clone()
            },
            measurement: if row.is_collected {
                row.measurement_name.clone()
            } else {
                "-".into()
            },
            scan_class: if !row.is_collected {
                "-".into()
            } else if row.scan_class_name.is_empty() {
                "none".into()
            } else {
                row.scan_class_name.clone()
            },
            enabled: match (row.is_collected, row.enabled) {
                (false, _) => "-".into(),
                (true, true) => "yes".into(),
                (true, false) => "no".into(),
            },
        }
    }
}

fn row_id(row: &MergedTagRow) -> String {
    row.key().to_string()
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(portal: &Portal, args: TagsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = portal.load_snapshot().await?;

    match args.command {
        TagsCommand::List {
            filter,
            view,
            sort,
            desc,
            group_by,
        } => {
            let criteria = util::build_criteria(&filter, Some(view), &snapshot)?;
            let mut rows = filter_rows(&snapshot.rows, &criteria);

            let direction = if desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            sort_rows(&mut rows, sort_key(sort), direction);

            match group_by {
                None => {
                    let out =
                        output::render_list(&global.output, &rows, |r| TagRow::from(r), row_id);
                    output::print_output(&out, global.quiet);
                }
                Some(group_by) => {
                    let groups = group_rows(&rows, group_key(group_by));
                    for (label, bucket) in &groups {
                        let collected = bucket.iter().filter(|r| r.is_collected).count();
                        if !global.quiet {
                            println!("── {label} ({} tags, {collected} collected)", bucket.len());
                        }
                        let out =
                            output::render_list(&global.output, bucket, |r| TagRow::from(r), row_id);
                        output::print_output(&out, global.quiet);
                    }
                }
            }

            if !global.quiet {
                eprintln!("{} / {} tags shown", rows.len(), snapshot.rows.len());
            }
            Ok(())
        }

        TagsCommand::Collect {
            filter,
            assign_scan_class,
        } => {
            let criteria = util::build_criteria(&filter, None, &snapshot)?;
            let rows = filter_rows(&snapshot.rows, &criteria);

            if let Some(id) = assign_scan_class {
                util::require_scan_class(&snapshot, id)?;
            }
            let chosen = resolve_scan_class(assign_scan_class, &snapshot.scan_classes);

            let plans = plan_collection(&rows, &snapshot.saved_by_device, chosen);
            if plans.is_empty() {
                if !global.quiet {
                    eprintln!("Nothing to collect: no matching available tags");
                }
                return Ok(());
            }

            let added = portal.add_to_collection(&plans).await?;
            if !global.quiet {
                let class = chosen.map_or_else(
                    || "no scan class".into(),
                    |id| format!("scan class {id}"),
                );
                eprintln!("Collected {added} tags ({class})");
            }
            Ok(())
        }

        TagsCommand::SetScanClass { filter, to } => {
            if let Some(id) = to {
                util::require_scan_class(&snapshot, id)?;
            }

            let criteria = util::build_criteria(&filter, None, &snapshot)?;
            let rows = collected_only(filter_rows(&snapshot.rows, &criteria));

            let patched = portal.bulk_assign_scan_class(&rows, to).await?;
            if !global.quiet {
                eprintln!("Scan class updated on {patched} tags");
            }
            Ok(())
        }

        TagsCommand::Enable { filter } => {
            let criteria = util::build_criteria(&filter, None, &snapshot)?;
            let rows = collected_only(filter_rows(&snapshot.rows, &criteria));
            let patched = portal.bulk_set_enabled(&rows, true).await?;
            if !global.quiet {
                eprintln!("Enabled {patched} tags");
            }
            Ok(())
        }

        TagsCommand::Disable { filter } => {
            let criteria = util::build_criteria(&filter, None, &snapshot)?;
            let rows = collected_only(filter_rows(&snapshot.rows, &criteria));
            let patched = portal.bulk_set_enabled(&rows, false).await?;
            if !global.quiet {
                eprintln!("Disabled {patched} tags");
            }
            Ok(())
        }

        TagsCommand::Remove { filter } => {
            let criteria = util::build_criteria(&filter, None, &snapshot)?;
            let rows = collected_only(filter_rows(&snapshot.rows, &criteria));
            if rows.is_empty() {
                if !global.quiet {
                    eprintln!("Nothing to remove: no matching collected tags");
                }
                return Ok(());
            }

            if !util::confirm(
                &format!("Remove {} tags from the collection?", rows.len()),
                global.yes,
            )? {
                return Ok(());
            }

            let removed = portal.bulk_remove(&rows).await?;
            if !global.quiet {
                eprintln!("Removed {removed} tags");
            }
            Ok(())
        }
    }
}

/// Mutating commands only touch rows that are already collected.
fn collected_only(rows: Vec<MergedTagRow>) -> Vec<MergedTagRow> {
    rows.into_iter().filter(|r| r.is_collected).collect()
}

fn sort_key(column: TagSortColumn) -> SortKey {
    match column {
        TagSortColumn::DeviceName => SortKey::DeviceName,
        TagSortColumn::DisplayName => SortKey::DisplayName,
        TagSortColumn::Path => SortKey::Path,
        TagSortColumn::Namespace => SortKey::Namespace,
        TagSortColumn::DataType => SortKey::DataType,
        TagSortColumn::Measurement => SortKey::MeasurementName,
        TagSortColumn::ScanClass => SortKey::ScanClassName,
        TagSortColumn::Enabled => SortKey::Enabled,
        TagSortColumn::Status => SortKey::Status,
    }
}

fn group_key(group_by: TagGroupBy) -> GroupKey {
    match group_by {
        TagGroupBy::Device => GroupKey::Device,
        TagGroupBy::ScanClass => GroupKey::ScanClass,
        TagGroupBy::Namespace => GroupKey::Namespace,
        TagGroupBy::DataType => GroupKey::DataType,
        TagGroupBy::Status => GroupKey::Status,
    }
}
