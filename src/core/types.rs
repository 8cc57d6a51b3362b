use serde::{Deserialize, Serialize};

use super::Class;

/// Period number (a year in the reference dataset).
pub type Period = u32;

/// Stable entity identifier.
pub type EntityId = String;

/// One observed unit (a film in the reference dataset) inside a period
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub unit_id: String,
    pub name: String,
    pub votes: i64,
    pub rating: f64,
}

impl UnitRecord {
    pub fn new(
        unit_id: impl Into<String>,
        name: impl Into<String>,
        votes: i64,
        rating: f64,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            name: name.into(),
            votes,
            rating,
        }
    }
}

/// Raw facts for one entity in one period. No snapshot exists for a period
/// with no activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub entity_id: EntityId,
    pub period: Period,
    pub units: Vec<UnitRecord>,
}

impl PeriodSnapshot {
    pub fn new(entity_id: impl Into<String>, period: Period) -> Self {
        Self {
            entity_id: entity_id.into(),
            period,
            units: Vec::new(),
        }
    }

    pub fn with_units(mut self, units: Vec<UnitRecord>) -> Self {
        self.units = units;
        self
    }

    /// Mean rating over this snapshot's units. `None` when the snapshot is
    /// empty (the mean is undefined, not zero).
    pub fn mean_rating(&self) -> Option<f64> {
        if self.units.is_empty() {
            return None;
        }
        let sum: f64 = self.units.iter().map(|u| u.rating).sum();
        Some(sum / self.units.len() as f64)
    }
}

/// One row per (entity, period): the entity's full accumulated unit history
/// up to and including `period`, plus the derived class and activity flag.
///
/// The unit list is owned by its record: extending it for the next period
/// clones rather than aliasing across periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeRecord {
    pub entity_id: EntityId,
    pub period: Period,
    pub units: Vec<UnitRecord>,
    pub class: Class,
    pub is_active: bool,
}

impl CumulativeRecord {
    /// The `(class, is_active)` pair tracked by the history table.
    pub fn status(&self) -> (Class, bool) {
        (self.class, self.is_active)
    }
}

/// One row per (entity, start_period): a maximal contiguous run of periods
/// over which `(class, is_active)` stayed constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub entity_id: EntityId,
    pub class: Class,
    pub is_active: bool,
    pub start_period: Period,
    pub end_period: Period,
    pub as_of_period: Period,
}

impl HistoryRecord {
    pub fn status(&self) -> (Class, bool) {
        (self.class, self.is_active)
    }

    /// Inclusive length of the validity interval.
    pub fn span(&self) -> u32 {
        self.end_period - self.start_period + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_rating() {
        let snap = PeriodSnapshot::new("a", 2001).with_units(vec![
            UnitRecord::new("u1", "one", 10, 9.0),
            UnitRecord::new("u2", "two", 20, 8.0),
        ]);
        assert_eq!(snap.mean_rating(), Some(8.5));
    }

    #[test]
    fn test_mean_rating_empty_is_undefined() {
        let snap = PeriodSnapshot::new("a", 2001);
        assert_eq!(snap.mean_rating(), None);
    }

    #[test]
    fn test_history_span() {
        let row = HistoryRecord {
            entity_id: "a".into(),
            class: Class::Top,
            is_active: true,
            start_period: 2001,
            end_period: 2004,
            as_of_period: 2005,
        };
        assert_eq!(row.span(), 4);
    }
}
