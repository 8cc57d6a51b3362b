pub mod class;
pub mod error;
pub mod types;

pub use class::Class;
pub use error::{DimError, Result};
pub use types::{CumulativeRecord, EntityId, HistoryRecord, Period, PeriodSnapshot, UnitRecord};
