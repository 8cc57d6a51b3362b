use crate::core::{Class, DimError, Result};

/// Threshold classification of a period's aggregated metric, plus the
/// activity carry-forward rule.
///
/// Thresholds are strict lower bounds checked from the top tier down, so
/// `classify` is monotonic in its input by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    top: f64,
    high: f64,
    mid: f64,
    default_active: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            top: 8.0,
            high: 7.0,
            mid: 6.0,
            default_active: true,
        }
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tier thresholds. They must be strictly descending.
    pub fn with_thresholds(mut self, top: f64, high: f64, mid: f64) -> Result<Self> {
        if !(top > high && high > mid) {
            return Err(DimError::ClassifierConfig(format!(
                "thresholds must be strictly descending, got top={}, high={}, mid={}",
                top, high, mid
            )));
        }
        self.top = top;
        self.high = high;
        self.mid = mid;
        Ok(self)
    }

    /// Activity value reported for an entity with no prior record and no
    /// snapshot this period.
    pub fn default_active(mut self, default: bool) -> Self {
        self.default_active = default;
        self
    }

    pub fn classify(&self, metric: f64) -> Class {
        if metric > self.top {
            Class::Top
        } else if metric > self.high {
            Class::High
        } else if metric > self.mid {
            Class::Mid
        } else {
            Class::Low
        }
    }

    /// True if a snapshot exists this period, else the previous period's
    /// value, else the configured default.
    pub fn activity(&self, has_snapshot: bool, previous: Option<bool>) -> bool {
        if has_snapshot {
            true
        } else {
            previous.unwrap_or(self.default_active)
        }
    }
}
