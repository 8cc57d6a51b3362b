//! Incremental history update: advance one entity's history by one period
//! without recomputing from scratch.
//!
//! Sequential application for periods 2..=N must reproduce a wholesale
//! backfill over 1..=N byte for byte; `tests/equivalence_tests.rs` holds
//! that property.

use crate::core::{CumulativeRecord, HistoryRecord, Period};

/// One entity's history change for a new period, decided against the open
/// row.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryPatch {
    /// First appearance: open a fresh single-period row.
    Start(HistoryRecord),
    /// Status unchanged: the open row's end advances in place.
    Extend(HistoryRecord),
    /// Status changed: the open row closes at the prior period and a new
    /// single-period row opens.
    Rotate {
        closed: HistoryRecord,
        opened: HistoryRecord,
    },
}

fn fresh_row(current: &CumulativeRecord) -> HistoryRecord {
    HistoryRecord {
        entity_id: current.entity_id.clone(),
        class: current.class,
        is_active: current.is_active,
        start_period: current.period,
        end_period: current.period,
        as_of_period: current.period,
    }
}

/// Decide the patch for one entity given its open row (the interval ending
/// at the prior period, if any) and its new cumulative row.
pub fn advance_entity(open: Option<&HistoryRecord>, current: &CumulativeRecord) -> HistoryPatch {
    match open {
        None => HistoryPatch::Start(fresh_row(current)),
        Some(open) if open.status() == current.status() => {
            let mut extended = open.clone();
            extended.end_period = current.period;
            HistoryPatch::Extend(extended)
        }
        Some(open) => HistoryPatch::Rotate {
            closed: open.clone(),
            opened: fresh_row(current),
        },
    }
}

/// Apply a patch to an entity's row list and restamp every row to `as_of`.
///
/// The restamp is what keeps the incremental result identical to a
/// wholesale backfill at the same cutoff.
pub fn apply_patch(rows: &mut Vec<HistoryRecord>, patch: HistoryPatch, as_of: Period) {
    match patch {
        HistoryPatch::Start(row) => rows.push(row),
        HistoryPatch::Extend(row) => {
            rows.pop();
            rows.push(row);
        }
        HistoryPatch::Rotate { closed, opened } => {
            rows.pop();
            rows.push(closed);
            rows.push(opened);
        }
    }
    for row in rows.iter_mut() {
        row.as_of_period = as_of;
    }
}
