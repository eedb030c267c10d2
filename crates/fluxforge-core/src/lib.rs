//! Tag view-model and console logic between `fluxforge-api` and the
//! UI consumers (CLI / TUI).
//!
//! This crate owns the parts of the console with real invariants:
//!
//! - **[`merge`]** — the tag view-model builder. Combines per-device scan
//!   results and saved tags into one deduplicated [`MergedTagRow`]
//!   collection, keyed by the composite (device, node) identity.
//!
//! - **[`filter`]** — pure filter/sort/group functions over merged rows:
//!   free-text search, anchored `*`/`?` wildcard matching, per-field
//!   criteria, stable sorting, and label-ordered grouping.
//!
//! - **[`selection`]** — the selection set ([`Selection`]) and the pure
//!   planning step for bulk add-to-collection ([`plan_collection`]).
//!
//! - **[`portal`]** — the [`Portal`] facade that executes snapshot loads
//!   and bulk actions against the API client. Every mutation is followed
//!   by a wholesale snapshot rebuild; there is no incremental patching of
//!   client state.
//!
//! - **[`scan`]** — the per-device scan state machine and the cancellable
//!   [`ScanWatcher`] polling task.

pub mod error;
pub mod filter;
pub mod merge;
pub mod model;
pub mod portal;
pub mod scan;
pub mod selection;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use filter::{
    CollectionView, FilterCriteria, GroupKey, ScanClassFilter, SortDirection, SortKey, Wildcard,
    filter_rows, group_rows, matches_wildcard, sort_rows,
};
pub use merge::{DeviceTagSet, build_merged_rows};
pub use model::{MergedTagRow, TagKey};
pub use portal::{Portal, TagSnapshot};
pub use scan::{ScanState, ScanUpdate, ScanWatcher};
pub use selection::{CollectPlan, Selection, plan_collection, resolve_scan_class};

// Re-export the wire types consumers need alongside the domain model.
pub use fluxforge_api::types::{
    Device, InfluxConfig, Metrics, OpcuaNode, SavedTag, ScanClass, SystemConfig,
};
