//! Resumable per-topic progress for one site.
//!
//! State lives in `<site>_status.json` and is rewritten after every stage,
//! so an interrupted run picks up at the first unfinished stage.

pub mod report;
pub mod stages;
pub mod state;
pub mod worker;

pub use report::RunReport;
pub use stages::ContentStages;
pub use state::{TrackerState, WorkItem};
pub use worker::{TrackerConfig, WorkTracker};
