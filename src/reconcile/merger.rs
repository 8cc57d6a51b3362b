//! Cumulative merge: period N-1 state + period N snapshots -> period N state.
//!
//! The relational full outer join becomes iteration over the sorted union
//! of entity keys from both inputs, so output order is deterministic.

use super::Classifier;
use crate::core::{CumulativeRecord, EntityId, Period, PeriodSnapshot};
use std::collections::{BTreeMap, BTreeSet};

/// Merge one entity's prior cumulative row with its current snapshot.
///
/// The class always derives from the current period's units alone, never
/// the accumulated history; an empty snapshot has no mean, so the prior
/// class is carried. Returns `None` for an entity observed for the first
/// time with zero units (nothing classifiable was observed).
pub fn merge_entity(
    previous: Option<&CumulativeRecord>,
    current: Option<&PeriodSnapshot>,
    period: Period,
    classifier: &Classifier,
) -> Option<CumulativeRecord> {
    match (previous, current) {
        (Some(prev), Some(snap)) => {
            let mut units = prev.units.clone();
            units.extend(snap.units.iter().cloned());
            let class = snap
                .mean_rating()
                .map(|mean| classifier.classify(mean))
                .unwrap_or(prev.class);
            Some(CumulativeRecord {
                entity_id: prev.entity_id.clone(),
                period,
                units,
                class,
                is_active: classifier.activity(true, Some(prev.is_active)),
            })
        }
        (Some(prev), None) => Some(CumulativeRecord {
            entity_id: prev.entity_id.clone(),
            period,
            units: prev.units.clone(),
            class: prev.class,
            is_active: classifier.activity(false, Some(prev.is_active)),
        }),
        (None, Some(snap)) => {
            let mean = snap.mean_rating()?;
            Some(CumulativeRecord {
                entity_id: snap.entity_id.clone(),
                period,
                units: snap.units.clone(),
                class: classifier.classify(mean),
                is_active: classifier.activity(true, None),
            })
        }
        (None, None) => None,
    }
}

/// Merge a whole period: one output row per entity present in either input.
///
/// Pure with respect to its inputs; running it twice for the same
/// (previous, period) pair yields identical output.
pub fn merge_period(
    previous: &BTreeMap<EntityId, CumulativeRecord>,
    snapshots: &[PeriodSnapshot],
    period: Period,
    classifier: &Classifier,
) -> Vec<CumulativeRecord> {
    let by_entity: BTreeMap<&str, &PeriodSnapshot> = snapshots
        .iter()
        .map(|s| (s.entity_id.as_str(), s))
        .collect();

    let keys: BTreeSet<&str> = previous
        .keys()
        .map(String::as_str)
        .chain(by_entity.keys().copied())
        .collect();

    keys.into_iter()
        .filter_map(|entity_id| {
            merge_entity(
                previous.get(entity_id),
                by_entity.get(entity_id).copied(),
                period,
                classifier,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Class, UnitRecord};

    fn snapshot(entity: &str, period: Period, ratings: &[f64]) -> PeriodSnapshot {
        let units = ratings
            .iter()
            .enumerate()
            .map(|(i, r)| UnitRecord::new(format!("{}-{}-{}", entity, period, i), "unit", 100, *r))
            .collect();
        PeriodSnapshot::new(entity, period).with_units(units)
    }

    #[test]
    fn test_new_entity_classified_from_current_mean() {
        let classifier = Classifier::new();
        let snap = snapshot("a", 2001, &[9.0, 9.0]);
        let merged = merge_entity(None, Some(&snap), 2001, &classifier).unwrap();

        assert_eq!(merged.class, Class::Top);
        assert!(merged.is_active);
        assert_eq!(merged.units.len(), 2);
        assert_eq!(merged.period, 2001);
    }

    #[test]
    fn test_carry_forward_without_snapshot() {
        let classifier = Classifier::new();
        let snap = snapshot("a", 2001, &[9.0]);
        let first = merge_entity(None, Some(&snap), 2001, &classifier).unwrap();
        let carried = merge_entity(Some(&first), None, 2002, &classifier).unwrap();

        assert_eq!(carried.class, first.class);
        assert_eq!(carried.is_active, first.is_active);
        assert_eq!(carried.units, first.units);
        assert_eq!(carried.period, 2002);
    }

    #[test]
    fn test_class_uses_current_period_only() {
        // A stellar history must not mask a weak current period.
        let classifier = Classifier::new();
        let first = merge_entity(None, Some(&snapshot("a", 2001, &[9.5, 9.5])), 2001, &classifier)
            .unwrap();
        let second = merge_entity(
            Some(&first),
            Some(&snapshot("a", 2002, &[4.0])),
            2002,
            &classifier,
        )
        .unwrap();

        assert_eq!(second.class, Class::Low);
        assert_eq!(second.units.len(), 3);
    }

    #[test]
    fn test_empty_snapshot_reuses_class_and_stays_active() {
        let classifier = Classifier::new();
        let first = merge_entity(None, Some(&snapshot("a", 2001, &[8.5])), 2001, &classifier)
            .unwrap();
        let empty = PeriodSnapshot::new("a", 2002);
        let second = merge_entity(Some(&first), Some(&empty), 2002, &classifier).unwrap();

        assert_eq!(second.class, Class::Top);
        assert!(second.is_active);
        assert_eq!(second.units.len(), 1);
    }

    #[test]
    fn test_first_ever_empty_snapshot_emits_nothing() {
        let classifier = Classifier::new();
        let empty = PeriodSnapshot::new("a", 2001);
        assert!(merge_entity(None, Some(&empty), 2001, &classifier).is_none());
    }

    #[test]
    fn test_merge_does_not_alias_previous_units() {
        let classifier = Classifier::new();
        let first = merge_entity(None, Some(&snapshot("a", 2001, &[9.0])), 2001, &classifier)
            .unwrap();
        let second = merge_entity(
            Some(&first),
            Some(&snapshot("a", 2002, &[7.5])),
            2002,
            &classifier,
        )
        .unwrap();

        assert_eq!(first.units.len(), 1);
        assert_eq!(second.units.len(), 2);
        assert_eq!(second.units[0], first.units[0]);
    }

    #[test]
    fn test_merge_period_unions_both_sides() {
        let classifier = Classifier::new();
        let mut previous = BTreeMap::new();
        for entity in ["carried", "updated"] {
            let row = merge_entity(
                None,
                Some(&snapshot(entity, 2001, &[7.5])),
                2001,
                &classifier,
            )
            .unwrap();
            previous.insert(entity.to_string(), row);
        }
        let snapshots = vec![snapshot("updated", 2002, &[5.0]), snapshot("new", 2002, &[9.0])];

        let merged = merge_period(&previous, &snapshots, 2002, &classifier);
        assert_eq!(merged.len(), 3);
        // Sorted union: carried, new, updated.
        assert_eq!(merged[0].entity_id, "carried");
        assert_eq!(merged[0].class, Class::High);
        assert_eq!(merged[1].entity_id, "new");
        assert_eq!(merged[1].class, Class::Top);
        assert_eq!(merged[2].entity_id, "updated");
        assert_eq!(merged[2].class, Class::Low);
    }

    #[test]
    fn test_merge_period_is_idempotent() {
        let classifier = Classifier::new();
        let mut previous = BTreeMap::new();
        previous.insert(
            "a".to_string(),
            merge_entity(None, Some(&snapshot("a", 2001, &[6.5])), 2001, &classifier).unwrap(),
        );
        let snapshots = vec![snapshot("a", 2002, &[8.5]), snapshot("b", 2002, &[5.5])];

        let once = merge_period(&previous, &snapshots, 2002, &classifier);
        let twice = merge_period(&previous, &snapshots, 2002, &classifier);
        assert_eq!(once, twice);
    }
}
