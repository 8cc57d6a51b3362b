use thiserror::Error;

use super::Period;

#[derive(Error, Debug)]
pub enum DimError {
    #[error("Entity '{0}' has no cumulative record for period {1}")]
    MissingPriorPeriod(String, Period),

    #[error("Period {0} is out of order (latest committed period is {1})")]
    PeriodOutOfOrder(Period, Period),

    #[error("History invariant violated for entity '{0}': {1}")]
    InvariantViolation(String, String),

    #[error("Snapshot source error: {0}")]
    SourceError(String),

    #[error("Classifier configuration error: {0}")]
    ClassifierConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, DimError>;

impl<T> From<std::sync::PoisonError<T>> for DimError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for DimError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
