pub mod detector;
pub mod event;
pub mod publish;
pub mod registry;
pub mod report;
pub mod source;
pub mod tracker;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use report::{CycleReport, EntityOutcome};
pub use tracker::Tracker;
