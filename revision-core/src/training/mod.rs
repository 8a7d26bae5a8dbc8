//! Training-side integration: the per-epoch driver contract, run traces and replay.

pub mod driver;
pub mod replay;
pub mod trace;

pub use driver::{EpochOutcome, EpochPlan, EpochTrainer, RevisionDriver};
pub use replay::{RecordedMetrics, ReplayTrainer};
pub use trace::{EpochRecord, ScheduleTrace};
