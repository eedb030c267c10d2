// ── Selection set and bulk add-to-collection planning ──
//
// Selection is keyed by the composite (device, node) identity, so the
// same node id on two devices selects independently. Planning is pure;
// the Portal facade executes the resulting payloads.

use std::collections::{HashMap, HashSet};

use fluxforge_api::types::{SavedTag, ScanClass, TagCreate};

use crate::filter::Wildcard;
use crate::model::{MergedTagRow, TagKey};

// ── Selection ────────────────────────────────────────────────────────

/// The set of selected row keys.
///
/// Owned by a single view and cleared after every bulk action; the
/// snapshot it selects against is rebuilt wholesale, so stale keys
/// simply stop matching rows.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    keys: HashSet<TagKey>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &TagKey) -> bool {
        self.keys.contains(key)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Flip one key in or out of the selection.
    pub fn toggle(&mut self, key: TagKey) {
        if !self.keys.remove(&key) {
            self.keys.insert(key);
        }
    }

    /// Select every visible row, or clear if all of them are already
    /// selected. Always scoped to the filtered view, never the full
    /// unfiltered table.
    pub fn toggle_all(&mut self, visible: &[MergedTagRow]) {
        let all_selected =
            !visible.is_empty() && visible.iter().all(|row| self.keys.contains(&row.key()));
        if all_selected {
            self.keys.clear();
        } else {
            self.keys = visible.iter().map(MergedTagRow::key).collect();
        }
    }

    /// Add every visible row matching the glob to the selection. Union
    /// only; rows selected earlier stay selected. An empty pattern is a
    /// no-op.
    pub fn select_matching(&mut self, pattern: &str, visible: &[MergedTagRow]) {
        if pattern.is_empty() {
            return;
        }
        let wildcard = Wildcard::new(pattern);
        for row in visible {
            if wildcard.is_match(row.pattern_target()) {
                self.keys.insert(row.key());
            }
        }
    }

    /// Project the selection onto a row set.
    pub fn selected_rows(&self, rows: &[MergedTagRow]) -> Vec<MergedTagRow> {
        rows.iter()
            .filter(|row| self.keys.contains(&row.key()))
            .cloned()
            .collect()
    }
}

// ── Bulk add-to-collection planning ──────────────────────────────────

/// One replace-all payload for a device: its existing saved tags plus the
/// newly collected entries.
#[derive(Debug, Clone)]
pub struct CollectPlan {
    pub device_id: i64,
    /// Full tag list to submit (the save call replaces, never appends).
    pub tags: Vec<TagCreate>,
    /// How many entries in `tags` are new.
    pub added: usize,
}

/// Scan class for newly collected tags: the explicit choice, else the
/// current default scan class, else none.
pub fn resolve_scan_class(explicit: Option<i64>, scan_classes: &[ScanClass]) -> Option<i64> {
    explicit.or_else(|| scan_classes.iter().find(|sc| sc.is_default).map(|sc| sc.id))
}

/// Plan the replace-all payloads for adding `rows` to the collection.
///
/// Already-collected rows are silently skipped. The remaining rows are
/// grouped by device in first-seen order; per device the payload is the
/// union of its existing saved tags and the new entries, dropping any
/// node id that is already saved or appeared earlier in the same batch.
/// New entries start enabled with an empty measurement name (the server
/// defaults it to the display name).
pub fn plan_collection(
    rows: &[MergedTagRow],
    saved_by_device: &HashMap<i64, Vec<SavedTag>>,
    scan_class_id: Option<i64>,
) -> Vec<CollectPlan> {
    // Group uncollected rows by device, preserving first-seen order.
    let mut order: Vec<i64> = Vec::new();
    let mut by_device: HashMap<i64, Vec<&MergedTagRow>> = HashMap::new();
    for row in rows {
        if row.is_collected {
            continue;
        }
        by_device
            .entry(row.device_id)
            .or_insert_with(|| {
                order.push(row.device_id);
                Vec::new()
            })
            .push(row);
    }

    order
        .into_iter()
        .filter_map(|device_id| {
            let new_rows = by_device.remove(&device_id)?;
            let existing = saved_by_device
                .get(&device_id)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let mut taken: HashSet<&str> =
                existing.iter().map(|tag| tag.node_id.as_str()).collect();
            let mut tags: Vec<TagCreate> = existing.iter().map(TagCreate::from).collect();
            let mut added = 0;

            for row in new_rows {
                if !taken.insert(row.node_id.as_str()) {
                    continue;
                }
                added += 1;
                tags.push(TagCreate {
                    device_id,
                    node_id: row.node_id.clone(),
                    namespace: row.namespace,
                    identifier: row.identifier.clone(),
                    identifier_type: row.identifier_type.clone(),
                    display_name: row.display_name.clone(),
                    path: row.path.clone(),
                    data_type: row.data_type.clone(),
                    measurement_name: String::new(),
                    scan_class_id,
                    enabled: true,
                });
            }

            (added > 0).then_some(CollectPlan {
                device_id,
                tags,
                added,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests_support::{row, saved, scan_class};

    fn visible() -> Vec<MergedTagRow> {
        let mut a = row(1, "ns=2;s=A");
        a.path = "Channel1.Device1.A".to_owned();
        let mut b = row(1, "ns=2;s=B");
        b.path = "Channel1.Device1.B".to_owned();
        let mut c = row(2, "ns=2;s=C");
        c.path = "Channel2.Device1.C".to_owned();
        vec![a, b, c]
    }

    // ── Selection ────────────────────────────────────────────────────

    #[test]
    fn toggle_flips_membership() {
        let mut sel = Selection::new();
        let key = TagKey::new(1, "ns=2;s=A");

        sel.toggle(key.clone());
        assert!(sel.contains(&key));

        sel.toggle(key.clone());
        assert!(!sel.contains(&key));
    }

    #[test]
    fn toggle_all_is_scoped_to_the_visible_rows() {
        let rows = visible();
        let mut sel = Selection::new();

        sel.toggle_all(&rows[..2]);
        assert_eq!(sel.len(), 2);
        assert!(!sel.contains(&rows[2].key()));

        // All visible already selected → clear.
        sel.toggle_all(&rows[..2]);
        assert!(sel.is_empty());
    }

    #[test]
    fn toggle_all_replaces_a_partial_selection() {
        let rows = visible();
        let mut sel = Selection::new();
        sel.toggle(rows[0].key());

        sel.toggle_all(&rows);
        assert_eq!(sel.len(), rows.len());
    }

    #[test]
    fn select_matching_is_union_only() {
        let rows = visible();
        let mut sel = Selection::new();
        sel.toggle(rows[2].key());

        sel.select_matching("Channel1.*", &rows);

        // The two Channel1 rows joined, the prior selection stayed.
        assert_eq!(sel.len(), 3);

        // An empty pattern never touches the selection.
        sel.select_matching("", &rows);
        assert_eq!(sel.len(), 3);
    }

    #[test]
    fn selected_rows_projects_by_composite_key() {
        let rows = visible();
        let mut sel = Selection::new();
        sel.toggle(TagKey::new(1, "ns=2;s=A"));
        // Same node id, different device — must not match.
        sel.toggle(TagKey::new(9, "ns=2;s=C"));

        let picked = sel.selected_rows(&rows);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].node_id, "ns=2;s=A");
    }

    // ── Planning ─────────────────────────────────────────────────────

    #[test]
    fn plan_unions_existing_tags_with_new_entries() {
        let rows = visible();
        let saved_by_device =
            HashMap::from([(1, vec![saved(10, 1, "ns=2;s=Existing")])]);

        let plans = plan_collection(&rows, &saved_by_device, Some(5));
        assert_eq!(plans.len(), 2);

        let device1 = &plans[0];
        assert_eq!(device1.device_id, 1);
        assert_eq!(device1.tags.len(), 3); // existing + A + B
        assert_eq!(device1.added, 2);
        // The existing tag keeps its own scan class (none), new ones get 5.
        assert_eq!(device1.tags[0].scan_class_id, None);
        assert!(device1.tags[1..].iter().all(|t| t.scan_class_id == Some(5)));
        assert!(device1.tags[1..].iter().all(|t| t.enabled));
    }

    #[test]
    fn plan_skips_collected_rows_and_batch_duplicates() {
        let mut a = row(1, "ns=2;s=A");
        a.is_collected = true;
        a.saved_tag_id = Some(10);
        let b = row(1, "ns=2;s=B");
        let b_dup = row(1, "ns=2;s=B");
        let already_saved = row(1, "ns=2;s=Existing");

        let saved_by_device =
            HashMap::from([(1, vec![saved(10, 1, "ns=2;s=A"), saved(11, 1, "ns=2;s=Existing")])]);

        let plans = plan_collection(
            &[a, b, b_dup, already_saved],
            &saved_by_device,
            None,
        );

        assert_eq!(plans.len(), 1);
        let plan = &plans[0];
        // Two existing + B once; the collected row, the in-batch duplicate,
        // and the server-side duplicate are all dropped.
        assert_eq!(plan.tags.len(), 3);
        assert_eq!(plan.added, 1);
        assert_eq!(
            plan.tags.iter().filter(|t| t.node_id == "ns=2;s=B").count(),
            1
        );
    }

    #[test]
    fn plan_with_nothing_to_add_is_empty() {
        let mut a = row(1, "ns=2;s=A");
        a.is_collected = true;
        a.saved_tag_id = Some(10);

        let plans = plan_collection(&[a], &HashMap::new(), None);
        assert!(plans.is_empty());
    }

    #[test]
    fn resolve_scan_class_prefers_explicit_then_default() {
        let classes = vec![scan_class(1, "Fast", false), scan_class(2, "Normal", true)];

        assert_eq!(resolve_scan_class(Some(1), &classes), Some(1));
        assert_eq!(resolve_scan_class(None, &classes), Some(2));
        assert_eq!(
            resolve_scan_class(None, &[scan_class(1, "Fast", false)]),
            None
        );
    }

    #[test]
    fn plan_applies_the_default_scan_class_to_every_new_entry() {
        let classes = vec![scan_class(7, "Normal", true)];
        let rows = vec![row(1, "ns=2;s=A"), row(1, "ns=2;s=B")];

        let chosen = resolve_scan_class(None, &classes);
        let plans = plan_collection(&rows, &HashMap::new(), chosen);

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].added, 2);
        assert!(plans[0].tags.iter().all(|t| t.scan_class_id == Some(7)));
    }
}
