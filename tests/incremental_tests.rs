use chronodim::prelude::advanced::{advance_entity, apply_patch, HistoryPatch};
use chronodim::{Class, CumulativeRecord, DimensionEngine, HistoryRecord, InMemorySnapshotStore, UnitRecord};

fn unit(id: &str, rating: f64) -> UnitRecord {
    UnitRecord::new(id, "unit", 1000, rating)
}

fn cumulative(entity: &str, period: u32, class: Class, active: bool) -> CumulativeRecord {
    CumulativeRecord {
        entity_id: entity.to_string(),
        period,
        units: Vec::new(),
        class,
        is_active: active,
    }
}

#[test]
fn test_extend_keeps_single_row() {
    let mut rows: Vec<HistoryRecord> = Vec::new();
    for period in 1..=4 {
        let current = cumulative("a", period, Class::Mid, true);
        let patch = advance_entity(rows.last().filter(|r| r.end_period == period - 1), &current);
        apply_patch(&mut rows, patch, period);
    }

    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].start_period, rows[0].end_period), (1, 4));
    assert_eq!(rows[0].as_of_period, 4);
}

#[test]
fn test_rotate_closes_at_prior_period() {
    let mut rows: Vec<HistoryRecord> = Vec::new();
    apply_patch(
        &mut rows,
        advance_entity(None, &cumulative("a", 1, Class::Top, true)),
        1,
    );
    let patch = advance_entity(rows.last(), &cumulative("a", 2, Class::Low, true));
    assert!(matches!(patch, HistoryPatch::Rotate { .. }));
    apply_patch(&mut rows, patch, 2);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].end_period, 1);
    assert_eq!((rows[1].start_period, rows[1].end_period), (2, 2));
}

#[test]
fn test_engine_counts_extends_and_rotates() {
    let mut store = InMemorySnapshotStore::new();
    // stable: Mid every period. mover: Top then Low.
    for period in 1..=3 {
        store.add_unit("stable", period, unit(&format!("s{}", period), 6.5));
    }
    store.add_unit("mover", 1, unit("m1", 9.0));
    store.add_unit("mover", 2, unit("m2", 9.0));
    store.add_unit("mover", 3, unit("m3", 4.0));

    let mut engine = DimensionEngine::new(store);

    let genesis = engine.reconcile(1).unwrap();
    assert_eq!(genesis.created, 2);
    assert_eq!(genesis.extended + genesis.rotated, 0);

    let second = engine.reconcile(2).unwrap();
    assert_eq!(second.merged, 2);
    assert_eq!(second.extended, 2);
    assert_eq!(second.rotated, 0);

    let third = engine.reconcile(3).unwrap();
    assert_eq!(third.extended, 1);
    assert_eq!(third.rotated, 1);
}

#[test]
fn test_gap_extends_instead_of_rotating() {
    // Activity carries forward across snapshot gaps, so a gap extends the
    // open run instead of rotating it.
    let mut store = InMemorySnapshotStore::new();
    store.add_unit("a", 1, unit("u1", 7.5));
    store.add_unit("a", 4, unit("u2", 7.5));

    let mut engine = DimensionEngine::new(store);
    for period in 1..=4 {
        assert!(engine.reconcile(period).unwrap().is_clean());
    }

    let rows = engine.history().rows_for("a");
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].start_period, rows[0].end_period), (1, 4));
    assert!(rows[0].is_active);
}
