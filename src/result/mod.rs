pub mod report;

pub use report::{EntityFailure, RunReport};
