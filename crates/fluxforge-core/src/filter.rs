// ── Filter / sort / group engine ──
//
// Pure functions over merged tag rows. Filtering is a conjunction of
// independent predicates, sorting is stable, grouping partitions the
// already-filtered-and-sorted rows by a derived label.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use regex::RegexBuilder;

use crate::model::MergedTagRow;

// ── Wildcard matching ────────────────────────────────────────────────

/// Translate a `*`/`?` glob into an anchored regex source string.
///
/// Every regex metacharacter except `*` and `?` is escaped, then `*`
/// becomes `.*` and `?` becomes `.`. Consecutive `**` therefore compiles
/// to `.*.*`, which matches the same inputs as a single `*`.
pub fn wildcard_regex(pattern: &str) -> String {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            '.' | '+' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\' => {
                source.push('\\');
                source.push(ch);
            }
            other => source.push(other),
        }
    }
    source.push('$');
    source
}

/// A compiled, case-insensitive, fully-anchored glob pattern.
///
/// The empty pattern matches everything. A pattern that fails to compile
/// (not reachable through [`wildcard_regex`], which escapes every
/// metacharacter) matches nothing.
#[derive(Debug, Clone)]
pub struct Wildcard {
    pattern: String,
    compiled: Option<regex::Regex>,
}

impl Wildcard {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let compiled = if pattern.is_empty() {
            None
        } else {
            RegexBuilder::new(&wildcard_regex(&pattern))
                .case_insensitive(true)
                .build()
                .ok()
        };
        Self { pattern, compiled }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, text: &str) -> bool {
        if self.pattern.is_empty() {
            return true;
        }
        self.compiled.as_ref().is_some_and(|re| re.is_match(text))
    }
}

/// One-shot glob match; compiles the pattern on every call. Prefer
/// [`Wildcard`] when matching many rows against the same pattern.
pub fn matches_wildcard(pattern: &str, text: &str) -> bool {
    Wildcard::new(pattern).is_match(text)
}

// ── Filter criteria ──────────────────────────────────────────────────

/// Which slice of the merged table is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionView {
    #[default]
    All,
    /// Only rows persisted as saved tags.
    Collected,
    /// Only rows discovered but not yet persisted.
    Available,
}

/// Scan-class filter value. `Unassigned` selects rows with no scan class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanClassFilter {
    Unassigned,
    Class(i64),
}

/// Active filter state for the merged tag table.
///
/// Every field is independent; a row passes only if it satisfies all of
/// them. Empty / `None` fields are inactive.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub view: CollectionView,
    /// Case-insensitive substring over display name, path, node id, and
    /// measurement name.
    pub search: String,
    /// Glob over the path (display name when the path is unknown).
    pub wildcard: String,
    pub device_id: Option<i64>,
    pub scan_class: Option<ScanClassFilter>,
    pub data_type: Option<String>,
    pub enabled: Option<bool>,
    pub namespace: Option<u16>,
}

impl FilterCriteria {
    /// `true` when no criterion is active (every row passes).
    pub fn is_empty(&self) -> bool {
        self.view == CollectionView::All
            && self.search.is_empty()
            && self.wildcard.is_empty()
            && self.device_id.is_none()
            && self.scan_class.is_none()
            && self.data_type.is_none()
            && self.enabled.is_none()
            && self.namespace.is_none()
    }
}

/// Apply every active criterion as a conjunction, short-circuiting on the
/// first failed predicate. Row order is preserved.
pub fn filter_rows(rows: &[MergedTagRow], criteria: &FilterCriteria) -> Vec<MergedTagRow> {
    let needle = criteria.search.to_lowercase();
    let wildcard = Wildcard::new(criteria.wildcard.as_str());

    rows.iter()
        .filter(|row| row_passes(row, criteria, &needle, &wildcard))
        .cloned()
        .collect()
}

fn row_passes(
    row: &MergedTagRow,
    criteria: &FilterCriteria,
    needle: &str,
    wildcard: &Wildcard,
) -> bool {
    match criteria.view {
        CollectionView::All => {}
        CollectionView::Collected => {
            if !row.is_collected {
                return false;
            }
        }
        CollectionView::Available => {
            if row.is_collected {
                return false;
            }
        }
    }

    if !needle.is_empty()
        && !row.display_name.to_lowercase().contains(needle)
        && !row.path.to_lowercase().contains(needle)
        && !row.node_id.to_lowercase().contains(needle)
        && !row.measurement_name.to_lowercase().contains(needle)
    {
        return false;
    }

    if !wildcard.is_empty() && !wildcard.is_match(row.pattern_target()) {
        return false;
    }

    if let Some(device_id) = criteria.device_id {
        if row.device_id != device_id {
            return false;
        }
    }

    match criteria.scan_class {
        Some(ScanClassFilter::Unassigned) if row.scan_class_id.is_some() => return false,
        Some(ScanClassFilter::Class(id)) if row.scan_class_id != Some(id) => return false,
        _ => {}
    }

    if let Some(ref data_type) = criteria.data_type {
        if row.data_type != *data_type {
            return false;
        }
    }

    if let Some(enabled) = criteria.enabled {
        if row.enabled != enabled {
            return false;
        }
    }

    if let Some(namespace) = criteria.namespace {
        if row.namespace != namespace {
            return false;
        }
    }

    true
}

// ── Sorting ──────────────────────────────────────────────────────────

/// Sortable columns of the merged tag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    DeviceName,
    #[default]
    DisplayName,
    Path,
    Namespace,
    DataType,
    MeasurementName,
    ScanClassName,
    Enabled,
    /// Collected / available status.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Stable in-place sort. Namespace compares numerically, the boolean
/// columns compare `false < true`, everything else compares as
/// case-insensitive strings (missing values as the empty string).
pub fn sort_rows(rows: &mut [MergedTagRow], key: SortKey, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

fn compare(a: &MergedTagRow, b: &MergedTagRow, key: SortKey) -> Ordering {
    match key {
        SortKey::DeviceName => str_cmp(&a.device_name, &b.device_name),
        SortKey::DisplayName => str_cmp(&a.display_name, &b.display_name),
        SortKey::Path => str_cmp(&a.path, &b.path),
        SortKey::Namespace => a.namespace.cmp(&b.namespace),
        SortKey::DataType => str_cmp(&a.data_type, &b.data_type),
        SortKey::MeasurementName => str_cmp(&a.measurement_name, &b.measurement_name),
        SortKey::ScanClassName => str_cmp(&a.scan_class_name, &b.scan_class_name),
        SortKey::Enabled => a.enabled.cmp(&b.enabled),
        SortKey::Status => a.is_collected.cmp(&b.is_collected),
    }
}

fn str_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

// ── Grouping ─────────────────────────────────────────────────────────

/// Grouping dimension for the merged tag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Device,
    ScanClass,
    Namespace,
    DataType,
    /// Collected vs. available.
    Status,
}

impl GroupKey {
    fn label(self, row: &MergedTagRow) -> String {
        match self {
            Self::Device => {
                if row.device_name.is_empty() {
                    format!("Device {}", row.device_id)
                } else {
                    row.device_name.clone()
                }
            }
            Self::ScanClass => {
                if row.scan_class_name.is_empty() {
                    "No Scan Class".to_owned()
                } else {
                    row.scan_class_name.clone()
                }
            }
            Self::Namespace => format!("Namespace {}", row.namespace),
            Self::DataType => {
                if row.data_type.is_empty() {
                    "Unknown".to_owned()
                } else {
                    row.data_type.clone()
                }
            }
            Self::Status => {
                if row.is_collected {
                    "Collected".to_owned()
                } else {
                    "Available".to_owned()
                }
            }
        }
    }
}

/// Partition rows into `(label, rows)` buckets, ordered by label
/// ascending. Within a bucket, input order is preserved, so callers
/// filter and sort first.
pub fn group_rows(rows: &[MergedTagRow], key: GroupKey) -> Vec<(String, Vec<MergedTagRow>)> {
    let mut buckets: BTreeMap<String, Vec<MergedTagRow>> = BTreeMap::new();
    for row in rows {
        buckets
            .entry(key.label(row))
            .or_default()
            .push(row.clone());
    }
    buckets.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests_support::row;

    // ── Wildcard semantics ───────────────────────────────────────────

    #[test]
    fn wildcard_star_spans_segments() {
        assert!(matches_wildcard(
            "Channel1.*.Temperature",
            "Channel1.Device1.Temperature"
        ));
        assert!(!matches_wildcard(
            "Channel1.*.Temperature",
            "Channel2.Device1.Temperature"
        ));
    }

    #[test]
    fn wildcard_empty_pattern_matches_everything() {
        assert!(matches_wildcard("", "anything at all"));
        assert!(matches_wildcard("", ""));
    }

    #[test]
    fn wildcard_question_mark_is_exactly_one_character() {
        assert!(matches_wildcard("A?C", "ABC"));
        assert!(!matches_wildcard("A?C", "AC"));
        assert!(!matches_wildcard("A?C", "ABBC"));
    }

    #[test]
    fn wildcard_is_case_insensitive_and_anchored() {
        assert!(matches_wildcard("channel1.*", "Channel1.Device1"));
        // Anchored: a trailing remainder must be covered by the pattern.
        assert!(!matches_wildcard("Channel1", "Channel1.Device1"));
    }

    #[test]
    fn wildcard_escapes_regex_metacharacters() {
        // The dots in OPC UA paths are literal dots, not "any char".
        assert!(!matches_wildcard("Channel1.Temp", "Channel1xTemp"));
        assert!(matches_wildcard("Temp (raw)", "Temp (raw)"));
        assert!(matches_wildcard("a+b", "a+b"));
        assert!(!matches_wildcard("a+b", "aab"));
    }

    #[test]
    fn wildcard_double_star_behaves_like_single_star() {
        assert!(matches_wildcard("Channel1.**", "Channel1.Device1.Temperature"));
        assert!(matches_wildcard("**", "anything"));
    }

    // ── Filtering ────────────────────────────────────────────────────

    fn sample_rows() -> Vec<MergedTagRow> {
        let mut a = row(1, "ns=2;s=Channel1.Device1.Temperature");
        a.display_name = "Temperature".to_owned();
        a.path = "Channel1.Device1.Temperature".to_owned();
        a.is_collected = true;
        a.saved_tag_id = Some(10);
        a.scan_class_id = Some(1);
        a.enabled = true;
        a.data_type = "Float".to_owned();

        let mut b = row(1, "ns=2;s=Channel1.Device1.Pressure");
        b.display_name = "Pressure".to_owned();
        b.path = "Channel1.Device1.Pressure".to_owned();
        b.data_type = "Double".to_owned();

        let mut c = row(2, "ns=3;s=Boiler.Level");
        c.display_name = "Level".to_owned();
        c.path = "Boiler.Level".to_owned();
        c.namespace = 3;
        c.is_collected = true;
        c.saved_tag_id = Some(20);
        c.data_type = "Float".to_owned();

        vec![a, b, c]
    }

    #[test]
    fn empty_criteria_pass_everything() {
        let rows = sample_rows();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_empty());
        assert_eq!(filter_rows(&rows, &criteria).len(), rows.len());
    }

    #[test]
    fn criteria_combine_as_a_conjunction() {
        let rows = sample_rows();

        let criteria = FilterCriteria {
            device_id: Some(1),
            data_type: Some("Float".to_owned()),
            ..FilterCriteria::default()
        };
        let out = filter_rows(&rows, &criteria);

        // Each row in the output satisfies every criterion independently.
        assert_eq!(out.len(), 1);
        assert!(out.iter().all(|r| r.device_id == 1));
        assert!(out.iter().all(|r| r.data_type == "Float"));
    }

    #[test]
    fn search_matches_any_text_field() {
        let rows = sample_rows();
        let criteria = FilterCriteria {
            search: "boiler".to_owned(),
            ..FilterCriteria::default()
        };
        let out = filter_rows(&rows, &criteria);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].display_name, "Level");
    }

    #[test]
    fn collection_view_splits_rows() {
        let rows = sample_rows();

        let collected = filter_rows(
            &rows,
            &FilterCriteria {
                view: CollectionView::Collected,
                ..FilterCriteria::default()
            },
        );
        let available = filter_rows(
            &rows,
            &FilterCriteria {
                view: CollectionView::Available,
                ..FilterCriteria::default()
            },
        );

        assert_eq!(collected.len(), 2);
        assert_eq!(available.len(), 1);
        assert_eq!(collected.len() + available.len(), rows.len());
    }

    #[test]
    fn unassigned_scan_class_filter_selects_null_rows() {
        let rows = sample_rows();

        let unassigned = filter_rows(
            &rows,
            &FilterCriteria {
                scan_class: Some(ScanClassFilter::Unassigned),
                ..FilterCriteria::default()
            },
        );
        assert_eq!(unassigned.len(), 2);
        assert!(unassigned.iter().all(|r| r.scan_class_id.is_none()));

        let class_one = filter_rows(
            &rows,
            &FilterCriteria {
                scan_class: Some(ScanClassFilter::Class(1)),
                ..FilterCriteria::default()
            },
        );
        assert_eq!(class_one.len(), 1);
        assert_eq!(class_one[0].scan_class_id, Some(1));
    }

    #[test]
    fn namespace_and_enabled_filters() {
        let rows = sample_rows();

        let ns3 = filter_rows(
            &rows,
            &FilterCriteria {
                namespace: Some(3),
                ..FilterCriteria::default()
            },
        );
        assert_eq!(ns3.len(), 1);

        let disabled = filter_rows(
            &rows,
            &FilterCriteria {
                enabled: Some(false),
                ..FilterCriteria::default()
            },
        );
        assert_eq!(disabled.len(), 2);
    }

    #[test]
    fn wildcard_falls_back_to_display_name_without_path() {
        let mut r = row(1, "ns=2;s=Humidity");
        r.display_name = "Humidity".to_owned();
        r.path = String::new();

        let out = filter_rows(
            &[r],
            &FilterCriteria {
                wildcard: "Hum*".to_owned(),
                ..FilterCriteria::default()
            },
        );
        assert_eq!(out.len(), 1);
    }

    // ── Sorting ──────────────────────────────────────────────────────

    #[test]
    fn sort_is_stable_for_tied_keys() {
        let mut rows = vec![
            row(1, "ns=2;s=A"),
            row(2, "ns=2;s=B"),
            row(3, "ns=2;s=C"),
        ];
        for r in &mut rows {
            r.data_type = "Float".to_owned();
        }

        sort_rows(&mut rows, SortKey::DataType, SortDirection::Ascending);

        // All keys tie, so the prior relative order is preserved.
        let ids: Vec<_> = rows.iter().map(|r| r.device_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn namespace_sorts_numerically() {
        let mut a = row(1, "ns=2;s=A");
        a.namespace = 10;
        let mut b = row(1, "ns=2;s=B");
        b.namespace = 2;

        let mut rows = vec![a, b];
        sort_rows(&mut rows, SortKey::Namespace, SortDirection::Ascending);
        assert_eq!(rows[0].namespace, 2);
        assert_eq!(rows[1].namespace, 10);
    }

    #[test]
    fn descending_reverses_the_comparator() {
        let mut a = row(1, "ns=2;s=A");
        a.display_name = "Alpha".to_owned();
        let mut b = row(1, "ns=2;s=B");
        b.display_name = "beta".to_owned();

        let mut rows = vec![a, b];
        sort_rows(&mut rows, SortKey::DisplayName, SortDirection::Descending);
        assert_eq!(rows[0].display_name, "beta");
    }

    // ── Grouping ─────────────────────────────────────────────────────

    #[test]
    fn groups_partition_the_input_exactly() {
        let rows = sample_rows();
        let groups = group_rows(&rows, GroupKey::Device);

        let total: usize = groups.iter().map(|(_, bucket)| bucket.len()).sum();
        assert_eq!(total, rows.len());

        // Each input row lands in exactly one bucket.
        for r in &rows {
            let hits = groups
                .iter()
                .flat_map(|(_, bucket)| bucket.iter())
                .filter(|g| g.key() == r.key())
                .count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn group_labels_are_sorted_ascending() {
        let rows = sample_rows();
        let groups = group_rows(&rows, GroupKey::Status);
        let labels: Vec<_> = groups.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["Available", "Collected"]);
    }

    #[test]
    fn scan_class_grouping_uses_fallback_label() {
        let mut a = row(1, "ns=2;s=A");
        a.scan_class_name = "Fast".to_owned();
        let b = row(1, "ns=2;s=B");

        let groups = group_rows(&[a, b], GroupKey::ScanClass);
        let labels: Vec<_> = groups.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["Fast", "No Scan Class"]);
    }

    #[test]
    fn namespace_grouping_labels() {
        let mut a = row(1, "ns=2;s=A");
        a.namespace = 2;
        let mut b = row(1, "ns=4;s=B");
        b.namespace = 4;

        let groups = group_rows(&[a, b], GroupKey::Namespace);
        let labels: Vec<_> = groups.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["Namespace 2", "Namespace 4"]);
    }
}
