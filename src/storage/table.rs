use crate::core::{CumulativeRecord, DimError, EntityId, HistoryRecord, Period, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cumulative current-state table: one row per (entity, period).
///
/// Commits are whole-period and append-only. Re-committing the latest
/// period replaces it (merges are deterministic, so a replay writes the
/// same rows); committing anything earlier is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CumulativeTable {
    periods: BTreeMap<Period, BTreeMap<EntityId, CumulativeRecord>>,
}

impl CumulativeTable {
    pub fn new() -> Self {
        Self {
            periods: BTreeMap::new(),
        }
    }

    pub fn latest_period(&self) -> Option<Period> {
        self.periods.keys().next_back().copied()
    }

    pub fn first_period(&self) -> Option<Period> {
        self.periods.keys().next().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn row_count(&self) -> usize {
        self.periods.values().map(|m| m.len()).sum()
    }

    /// All rows committed for `period`, keyed by entity.
    pub fn rows_at(&self, period: Period) -> Option<&BTreeMap<EntityId, CumulativeRecord>> {
        self.periods.get(&period)
    }

    pub fn row(&self, entity_id: &str, period: Period) -> Option<&CumulativeRecord> {
        self.periods.get(&period).and_then(|m| m.get(entity_id))
    }

    /// The entity's rows up to and including `as_of`, ordered by period.
    pub fn entity_series(&self, entity_id: &str, as_of: Period) -> Vec<&CumulativeRecord> {
        self.periods
            .range(..=as_of)
            .filter_map(|(_, m)| m.get(entity_id))
            .collect()
    }

    pub fn first_period_of(&self, entity_id: &str) -> Option<Period> {
        self.periods
            .iter()
            .find(|(_, m)| m.contains_key(entity_id))
            .map(|(p, _)| *p)
    }

    pub fn latest_period_of(&self, entity_id: &str) -> Option<Period> {
        self.periods
            .iter()
            .rev()
            .find(|(_, m)| m.contains_key(entity_id))
            .map(|(p, _)| *p)
    }

    /// Every entity having at least one row at or before `through`, with
    /// the latest such period.
    pub fn latest_periods_through(&self, through: Period) -> BTreeMap<EntityId, Period> {
        let mut latest = BTreeMap::new();
        for (period, rows) in self.periods.range(..=through) {
            for entity_id in rows.keys() {
                latest.insert(entity_id.clone(), *period);
            }
        }
        latest
    }

    /// Commit a whole period of rows.
    ///
    /// `period` must not precede the latest committed period; every row must
    /// carry `period` itself.
    pub fn commit_period(&mut self, period: Period, rows: Vec<CumulativeRecord>) -> Result<()> {
        if let Some(latest) = self.latest_period() {
            if period < latest {
                return Err(DimError::PeriodOutOfOrder(period, latest));
            }
        }
        let mut keyed = BTreeMap::new();
        for row in rows {
            debug_assert_eq!(row.period, period);
            keyed.insert(row.entity_id.clone(), row);
        }
        self.periods.insert(period, keyed);
        Ok(())
    }
}

/// Type-2 history table: per entity, the ordered validity-interval rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryTable {
    as_of: Option<Period>,
    rows: BTreeMap<EntityId, Vec<HistoryRecord>>,
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            as_of: None,
            rows: BTreeMap::new(),
        }
    }

    /// The period the table was last advanced to.
    pub fn as_of(&self) -> Option<Period> {
        self.as_of
    }

    pub fn set_as_of(&mut self, period: Period) {
        self.as_of = Some(period);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.values().map(|v| v.len()).sum()
    }

    pub fn entity_count(&self) -> usize {
        self.rows.len()
    }

    /// The entity's interval rows, ordered by start period.
    pub fn rows_for(&self, entity_id: &str) -> &[HistoryRecord] {
        self.rows.get(entity_id).map_or(&[], |v| v.as_slice())
    }

    /// The entity's open row: its last interval, provided it ends exactly at
    /// `period`.
    pub fn open_row(&self, entity_id: &str, period: Period) -> Option<&HistoryRecord> {
        self.rows
            .get(entity_id)
            .and_then(|v| v.last())
            .filter(|r| r.end_period == period)
    }

    /// All rows, ordered by (entity, start period).
    pub fn all_rows(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.rows.values().flatten()
    }

    pub fn replace_entity(&mut self, entity_id: impl Into<String>, rows: Vec<HistoryRecord>) {
        self.rows.insert(entity_id.into(), rows);
    }

    /// Swap in a wholesale-recomputed table state.
    pub fn replace_all(&mut self, rows: BTreeMap<EntityId, Vec<HistoryRecord>>, as_of: Period) {
        self.rows = rows;
        self.as_of = Some(as_of);
    }
}

/// Check that an entity's history rows partition `[first_period, as_of]`
/// into contiguous, non-overlapping, maximal runs.
pub fn check_partition(
    entity_id: &str,
    rows: &[HistoryRecord],
    first_period: Period,
    as_of: Period,
) -> Result<()> {
    let violation = |reason: String| DimError::InvariantViolation(entity_id.to_string(), reason);

    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Err(violation("no history rows".to_string()));
    };
    if first.start_period != first_period {
        return Err(violation(format!(
            "first interval starts at {} instead of {}",
            first.start_period, first_period
        )));
    }
    for row in rows {
        if row.start_period > row.end_period {
            return Err(violation(format!(
                "interval [{}, {}] is inverted",
                row.start_period, row.end_period
            )));
        }
        if row.as_of_period != as_of {
            return Err(violation(format!(
                "interval [{}, {}] is stamped as-of {} instead of {}",
                row.start_period, row.end_period, row.as_of_period, as_of
            )));
        }
    }
    for pair in rows.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.start_period != prev.end_period + 1 {
            return Err(violation(format!(
                "gap or overlap between [{}, {}] and [{}, {}]",
                prev.start_period, prev.end_period, next.start_period, next.end_period
            )));
        }
        if prev.status() == next.status() {
            return Err(violation(format!(
                "intervals [{}, {}] and [{}, {}] share status {:?} and should be one run",
                prev.start_period, prev.end_period, next.start_period, next.end_period,
                next.status()
            )));
        }
    }
    if last.end_period != as_of {
        return Err(violation(format!(
            "last interval ends at {} instead of {}",
            last.end_period, as_of
        )));
    }
    Ok(())
}
