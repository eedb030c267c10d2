// ── Derived domain model ──

mod row;

pub use row::{MergedTagRow, TagKey};
