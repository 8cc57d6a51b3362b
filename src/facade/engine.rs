use crate::core::{CumulativeRecord, DimError, EntityId, Period, PeriodSnapshot, Result};
use crate::reconcile::{
    advance_entity, apply_patch, backfill_entity, merge_entity, Classifier, HistoryPatch,
};
use crate::result::RunReport;
use crate::storage::{
    check_partition, CumulativeTable, HistoryTable, SnapshotManager, SnapshotSource, StoreSnapshot,
};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Outcome of reconciling one entity for one period.
enum EntityOutcome {
    /// A new cumulative row, tagged with how it came to be.
    Row(CumulativeRecord, RowKind),
    /// Per-entity failure; collected into the report, never aborts the run.
    Failed(EntityId, DimError),
    /// Nothing observable (first-ever snapshot with zero units).
    Skipped,
}

#[derive(Clone, Copy)]
enum RowKind {
    Created,
    Merged,
    Carried,
}

/// The library facade: owns the snapshot source, the classifier and both
/// output tables, and drives reconciliation one period at a time.
///
/// Callers serialize runs (single-writer discipline); reads of committed
/// state through the accessors may happen between runs.
///
/// # Examples
///
/// ```
/// use chronodim::{DimensionEngine, InMemorySnapshotStore, UnitRecord};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = InMemorySnapshotStore::new();
/// store.add_unit("mel_brooks", 1974, UnitRecord::new("tt0071230", "Blazing Saddles", 140_000, 7.7));
/// store.add_unit("mel_brooks", 1974, UnitRecord::new("tt0072431", "Young Frankenstein", 160_000, 8.0));
///
/// let mut engine = DimensionEngine::new(store);
/// let report = engine.reconcile(1974)?;
/// assert!(report.is_clean());
/// assert_eq!(engine.history().row_count(), 1);
/// # Ok(())
/// # }
/// ```
pub struct DimensionEngine<S: SnapshotSource> {
    source: S,
    classifier: Classifier,
    cumulative: CumulativeTable,
    history: HistoryTable,
}

impl<S: SnapshotSource> DimensionEngine<S> {
    pub fn new(source: S) -> Self {
        Self::with_classifier(source, Classifier::default())
    }

    pub fn with_classifier(source: S, classifier: Classifier) -> Self {
        Self {
            source,
            classifier,
            cumulative: CumulativeTable::new(),
            history: HistoryTable::new(),
        }
    }

    /// Rebuild an engine around previously persisted tables.
    pub fn from_parts(
        source: S,
        classifier: Classifier,
        cumulative: CumulativeTable,
        history: HistoryTable,
    ) -> Self {
        Self {
            source,
            classifier,
            cumulative,
            history,
        }
    }

    pub fn cumulative(&self) -> &CumulativeTable {
        &self.cumulative
    }

    pub fn history(&self) -> &HistoryTable {
        &self.history
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Reconcile one period forward.
    ///
    /// Accepts the genesis period on an empty engine, `latest + 1` to
    /// advance, or `latest` to re-run the last period (deterministic, so
    /// the replay commits identical rows). Anything else is out of order.
    pub fn reconcile(&mut self, period: Period) -> Result<RunReport> {
        let rerun = match self.cumulative.latest_period() {
            None => false,
            Some(latest) if period == latest + 1 => false,
            Some(latest) if period == latest => true,
            Some(latest) => return Err(DimError::PeriodOutOfOrder(period, latest)),
        };

        let mut report = RunReport::new(period);
        let snapshots = self.source.snapshots_for(period)?;
        info!(
            "reconciling period {} ({} snapshots{})",
            period,
            snapshots.len(),
            if rerun { ", re-run" } else { "" }
        );

        let outcomes = self.reconcile_entities(period, &snapshots);

        let mut rows = Vec::new();
        for outcome in outcomes {
            match outcome {
                EntityOutcome::Row(row, kind) => {
                    match kind {
                        RowKind::Created => report.created += 1,
                        RowKind::Merged => report.merged += 1,
                        RowKind::Carried => report.carried += 1,
                    }
                    rows.push(row);
                }
                EntityOutcome::Failed(entity_id, error) => {
                    warn!("entity '{}' failed: {}", entity_id, error);
                    report.record_failure(entity_id, error);
                }
                EntityOutcome::Skipped => {
                    debug!("skipped an unclassifiable first appearance");
                }
            }
        }

        self.cumulative.commit_period(period, rows.clone())?;

        if rerun {
            // The prior run already advanced the open rows to this period,
            // so patching again would double-apply; recompute wholesale.
            self.rebuild_history(period)?;
        } else {
            self.advance_history(period, &rows, &mut report);
        }

        info!(
            "period {} done: {} entities, {} failures",
            period,
            report.entities_processed(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Reconcile every missing period up to and including `through`.
    pub fn reconcile_through(&mut self, through: Period) -> Result<Vec<RunReport>> {
        let start = match self.cumulative.latest_period() {
            Some(latest) => latest + 1,
            None => match self.source.periods().first() {
                Some(first) => *first,
                None => return Err(DimError::SourceError("source has no periods".to_string())),
            },
        };

        let mut reports = Vec::new();
        for period in start..=through {
            reports.push(self.reconcile(period)?);
        }
        Ok(reports)
    }

    /// Recompute the whole history table from the cumulative table, up to
    /// and including `as_of`.
    ///
    /// An entity whose cumulative series stops short of `as_of` (it failed
    /// an earlier run and was never repaired) keeps its own last period as
    /// the stamp, marking its rows stale.
    pub fn rebuild_history(&mut self, as_of: Period) -> Result<()> {
        let entities: Vec<EntityId> = self
            .cumulative
            .latest_periods_through(as_of)
            .into_keys()
            .collect();

        let rebuilt: Vec<(EntityId, Vec<_>)> = entities
            .into_par_iter()
            .map(|entity_id| {
                let series = self.cumulative.entity_series(&entity_id, as_of);
                let cutoff = series.last().map(|r| r.period).unwrap_or(as_of);
                if cutoff < as_of {
                    warn!(
                        "entity '{}' is stale: cumulative series ends at {}, not {}",
                        entity_id, cutoff, as_of
                    );
                }
                let rows = backfill_entity(series, cutoff);
                (entity_id, rows)
            })
            .collect();

        let mut by_entity = BTreeMap::new();
        for (entity_id, rows) in rebuilt {
            if !rows.is_empty() {
                by_entity.insert(entity_id, rows);
            }
        }
        self.history.replace_all(by_entity, as_of);
        info!(
            "rebuilt history as of {}: {} rows",
            as_of,
            self.history.row_count()
        );
        Ok(())
    }

    /// Persist both output tables as a binary store snapshot.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let manager = SnapshotManager::new(path);
        manager.save(&StoreSnapshot::new(
            self.cumulative.clone(),
            self.history.clone(),
        ))
    }

    /// Restore an engine from a store snapshot, if one exists at `path`.
    pub fn load<P: AsRef<Path>>(source: S, path: P) -> Result<Option<Self>> {
        let manager = SnapshotManager::new(path);
        let Some(snapshot) = manager.load()? else {
            return Ok(None);
        };
        Ok(Some(Self::from_parts(
            source,
            Classifier::default(),
            snapshot.cumulative,
            snapshot.history,
        )))
    }

    /// Compute every entity's outcome for `period`. Entities are
    /// independent within a period, so the fan-out is parallel; outcome
    /// order follows the sorted entity union and stays deterministic.
    fn reconcile_entities(
        &self,
        period: Period,
        snapshots: &[PeriodSnapshot],
    ) -> Vec<EntityOutcome> {
        let by_entity: BTreeMap<&str, &PeriodSnapshot> = snapshots
            .iter()
            .map(|s| (s.entity_id.as_str(), s))
            .collect();

        let prior_period = period.checked_sub(1);
        let prior = prior_period.and_then(|p| self.cumulative.rows_at(p));
        let known = prior_period
            .map(|p| self.cumulative.latest_periods_through(p))
            .unwrap_or_default();

        let entities: Vec<&str> = prior
            .map(|rows| rows.keys().map(String::as_str).collect::<BTreeSet<_>>())
            .unwrap_or_default()
            .into_iter()
            .chain(by_entity.keys().copied())
            .chain(known.keys().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        entities
            .into_par_iter()
            .map(|entity_id| {
                let previous = prior.and_then(|rows| rows.get(entity_id));
                if previous.is_none() && known.contains_key(entity_id) {
                    // Known entity with no row at period-1: an earlier failure
                    // left a gap, so this entity cannot advance.
                    return EntityOutcome::Failed(
                        entity_id.to_string(),
                        DimError::MissingPriorPeriod(entity_id.to_string(), period - 1),
                    );
                }
                let snapshot = by_entity.get(entity_id).copied();
                let kind = match (previous.is_some(), snapshot.is_some()) {
                    (true, true) => RowKind::Merged,
                    (true, false) => RowKind::Carried,
                    _ => RowKind::Created,
                };
                match merge_entity(previous, snapshot, period, &self.classifier) {
                    Some(row) => EntityOutcome::Row(row, kind),
                    None => EntityOutcome::Skipped,
                }
            })
            .collect()
    }

    /// Patch history per successfully merged entity, validating the
    /// partition invariant before committing each entity's rows. A
    /// violation leaves that entity's previous rows untouched.
    fn advance_history(
        &mut self,
        period: Period,
        rows: &[CumulativeRecord],
        report: &mut RunReport,
    ) {
        let prior_period = period.checked_sub(1);
        for row in rows {
            let entity_id = row.entity_id.clone();
            let open = prior_period
                .and_then(|p| self.history.open_row(&entity_id, p))
                .cloned();
            let patch = advance_entity(open.as_ref(), row);
            let extended = matches!(patch, HistoryPatch::Extend(_));
            let rotated = matches!(patch, HistoryPatch::Rotate { .. });

            let mut patched = self.history.rows_for(&entity_id).to_vec();
            apply_patch(&mut patched, patch, period);

            let first = self
                .cumulative
                .first_period_of(&entity_id)
                .unwrap_or(period);
            match check_partition(&entity_id, &patched, first, period) {
                Ok(()) => {
                    report.extended += extended as usize;
                    report.rotated += rotated as usize;
                    self.history.replace_entity(entity_id, patched);
                }
                Err(error) => {
                    warn!("history for '{}' not updated: {}", entity_id, error);
                    report.record_failure(entity_id, error);
                }
            }
        }
        self.history.set_as_of(period);
    }
}
