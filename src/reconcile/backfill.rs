//! Wholesale history recomputation from a full cumulative time series.

use crate::core::{CumulativeRecord, HistoryRecord, Period};

/// Fold one entity's cumulative series (ordered by period, all periods
/// `<= as_of`) into maximal same-status runs.
///
/// A run breaks when `(class, is_active)` changes; the first period always
/// starts one. Idempotent: an unchanged series yields identical rows.
pub fn backfill_entity<'a, I>(series: I, as_of: Period) -> Vec<HistoryRecord>
where
    I: IntoIterator<Item = &'a CumulativeRecord>,
{
    let mut rows: Vec<HistoryRecord> = Vec::new();

    for record in series {
        match rows.last_mut() {
            Some(open) if open.status() == record.status() => {
                open.end_period = record.period;
            }
            _ => rows.push(HistoryRecord {
                entity_id: record.entity_id.clone(),
                class: record.class,
                is_active: record.is_active,
                start_period: record.period,
                end_period: record.period,
                as_of_period: as_of,
            }),
        }
    }

    rows
}
