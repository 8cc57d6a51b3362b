//! Recommended API entrypoints grouped by abstraction level.
//!
//! Most applications only need the engine surface; the reconciliation
//! primitives are an explicit escape hatch for callers driving their own
//! tables.

pub use crate::core::{
    Class, CumulativeRecord, DimError, EntityId, HistoryRecord, Period, PeriodSnapshot, Result,
    UnitRecord,
};
pub use crate::facade::DimensionEngine;
pub use crate::reconcile::Classifier;
pub use crate::result::{EntityFailure, RunReport};
pub use crate::storage::{InMemorySnapshotStore, SnapshotSource};

pub mod advanced {
    //! Escape hatch for the reconciliation primitives and table internals.
    pub use crate::reconcile::{
        advance_entity, apply_patch, backfill_entity, merge_entity, merge_period, HistoryPatch,
    };
    pub use crate::storage::{
        check_partition, CumulativeTable, HistoryTable, SnapshotManager, StoreSnapshot,
    };
}
