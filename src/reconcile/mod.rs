pub mod backfill;
pub mod classify;
pub mod incremental;
pub mod merger;

pub use backfill::backfill_entity;
pub use classify::Classifier;
pub use incremental::{advance_entity, apply_patch, HistoryPatch};
pub use merger::{merge_entity, merge_period};
