use super::SnapshotSource;
use crate::core::{EntityId, Period, PeriodSnapshot, Result, UnitRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference in-memory snapshot source.
///
/// Snapshots are keyed by period, then entity, so `snapshots_for` returns a
/// deterministic (entity-sorted) batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemorySnapshotStore {
    periods: BTreeMap<Period, BTreeMap<EntityId, PeriodSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            periods: BTreeMap::new(),
        }
    }

    /// Record one observed unit for an entity in a period, creating the
    /// snapshot on first use.
    pub fn add_unit(&mut self, entity_id: impl Into<String>, period: Period, unit: UnitRecord) {
        let entity_id = entity_id.into();
        self.periods
            .entry(period)
            .or_default()
            .entry(entity_id.clone())
            .or_insert_with(|| PeriodSnapshot::new(entity_id, period))
            .units
            .push(unit);
    }

    /// Insert a whole snapshot. Units of an existing snapshot for the same
    /// (entity, period) are extended, not replaced.
    pub fn add_snapshot(&mut self, snapshot: PeriodSnapshot) {
        let slot = self
            .periods
            .entry(snapshot.period)
            .or_default()
            .entry(snapshot.entity_id.clone())
            .or_insert_with(|| PeriodSnapshot::new(snapshot.entity_id.clone(), snapshot.period));
        slot.units.extend(snapshot.units);
    }

    pub fn snapshot(&self, entity_id: &str, period: Period) -> Option<&PeriodSnapshot> {
        self.periods.get(&period).and_then(|m| m.get(entity_id))
    }

    pub fn entity_count(&self, period: Period) -> usize {
        self.periods.get(&period).map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

impl SnapshotSource for InMemorySnapshotStore {
    fn snapshots_for(&self, period: Period) -> Result<Vec<PeriodSnapshot>> {
        Ok(self
            .periods
            .get(&period)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    fn periods(&self) -> Vec<Period> {
        self.periods.keys().copied().collect()
    }

    fn has_period(&self, period: Period) -> bool {
        self.periods.contains_key(&period)
    }
}
