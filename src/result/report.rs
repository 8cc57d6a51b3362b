use crate::core::{DimError, EntityId, Period};
use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};

/// One entity's failure inside an otherwise successful run.
#[derive(Debug)]
pub struct EntityFailure {
    pub entity_id: EntityId,
    pub error: DimError,
}

/// Batch summary of one reconciliation run.
///
/// Per-entity errors are collected here instead of aborting the run; a
/// clean report has no failures.
#[derive(Debug)]
pub struct RunReport {
    pub period: Period,
    pub started_at: DateTime<Utc>,
    /// Entities observed for the first time this period.
    pub created: usize,
    /// Entities merged from prior state plus a new snapshot.
    pub merged: usize,
    /// Entities carried forward with no snapshot this period.
    pub carried: usize,
    /// History rows extended in place.
    pub extended: usize,
    /// History rows closed and reopened with a new status.
    pub rotated: usize,
    pub failures: Vec<EntityFailure>,
}

impl RunReport {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            started_at: Utc::now(),
            created: 0,
            merged: 0,
            carried: 0,
            extended: 0,
            rotated: 0,
            failures: Vec::new(),
        }
    }

    pub fn entities_processed(&self) -> usize {
        self.created + self.merged + self.carried
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn record_failure(&mut self, entity_id: impl Into<String>, error: DimError) {
        self.failures.push(EntityFailure {
            entity_id: entity_id.into(),
            error,
        });
    }

    pub fn print(&self) {
        let fields = [
            ("period", self.period.to_string()),
            ("entities", self.entities_processed().to_string()),
            ("created", self.created.to_string()),
            ("merged", self.merged.to_string()),
            ("carried", self.carried.to_string()),
            ("extended", self.extended.to_string()),
            ("rotated", self.rotated.to_string()),
            ("failures", self.failures.len().to_string()),
        ];

        let width = fields.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        for (name, value) in &fields {
            println!("{:width$} | {}", name, value, width = width);
        }

        for failure in &self.failures {
            println!("  {} -> {}", failure.entity_id, failure.error);
        }
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "period": self.period,
            "started_at": self.started_at.to_rfc3339(),
            "entities": self.entities_processed(),
            "created": self.created,
            "merged": self.merged,
            "carried": self.carried,
            "extended": self.extended,
            "rotated": self.rotated,
            "failures": self.failures.iter().map(|f| json!({
                "entity_id": f.entity_id,
                "error": f.error.to_string(),
            })).collect::<Vec<_>>(),
        })
    }
}
