// ============================================================================
// Chronodim Library
// ============================================================================

pub mod core;
pub mod storage;
pub mod result;
pub mod reconcile;
pub mod facade;
pub mod prelude;

// Re-export main types for convenience
pub use crate::core::{
    Class, CumulativeRecord, DimError, EntityId, HistoryRecord, Period, PeriodSnapshot, Result,
    UnitRecord,
};
pub use crate::facade::DimensionEngine;
pub use crate::reconcile::Classifier;
pub use crate::result::{EntityFailure, RunReport};
pub use crate::storage::{InMemorySnapshotStore, SnapshotSource};

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, rating: f64) -> UnitRecord {
        UnitRecord::new(id, "unit", 1000, rating)
    }

    #[test]
    fn test_engine_single_period() {
        let mut store = InMemorySnapshotStore::new();
        store.add_unit("a", 2001, unit("u1", 9.0));

        let mut engine = DimensionEngine::new(store);
        let report = engine.reconcile(2001).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.created, 1);
        assert_eq!(engine.cumulative().row_count(), 1);
        assert_eq!(engine.history().row_count(), 1);
    }

    #[test]
    fn test_engine_three_period_flow() {
        let mut store = InMemorySnapshotStore::new();
        store.add_unit("a", 2001, unit("u1", 9.0));
        store.add_unit("a", 2001, unit("u2", 9.0));
        store.add_unit("a", 2003, unit("u3", 5.0));

        let mut engine = DimensionEngine::new(store);
        for period in 2001..=2003 {
            assert!(engine.reconcile(period).unwrap().is_clean());
        }

        let rows = engine.history().rows_for("a");
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].start_period, rows[0].end_period), (2001, 2002));
        assert_eq!((rows[1].start_period, rows[1].end_period), (2003, 2003));
    }

    #[test]
    fn test_engine_rejects_out_of_order_period() {
        let mut store = InMemorySnapshotStore::new();
        store.add_unit("a", 2001, unit("u1", 7.5));

        let mut engine = DimensionEngine::new(store);
        engine.reconcile(2001).unwrap();

        let err = engine.reconcile(2005).unwrap_err();
        assert!(matches!(err, DimError::PeriodOutOfOrder(2005, 2001)));
    }
}
