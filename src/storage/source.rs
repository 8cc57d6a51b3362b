use crate::core::{Period, PeriodSnapshot, Result};

/// Snapshot source trait - allows pluggable snapshot backends
///
/// The engine only ever reads from the source; writes belong to whatever
/// system produces the raw snapshots.
pub trait SnapshotSource: Send + Sync {
    /// All snapshots observed in `period`, at most one per entity.
    fn snapshots_for(&self, period: Period) -> Result<Vec<PeriodSnapshot>>;

    /// Periods with any observed activity, ascending.
    fn periods(&self) -> Vec<Period>;

    /// Check if any entity was observed in `period`
    fn has_period(&self, period: Period) -> bool {
        self.periods().contains(&period)
    }
}
