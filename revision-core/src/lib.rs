//! # revision-core — Threshold Scheduling for Selective-Revision Training
//!
//! Under selective revision, a per-epoch threshold (tau) decides which samples
//! are admitted to gradient updates and which are held back for later. This
//! crate computes that threshold.
//!
//! - [`schedule`]: clamp/progress helpers, the append-only [`SchedulerState`]
//!   history and the [`ThresholdScheduler`] policy catalogue.
//! - [`config`]: layered configuration (defaults, TOML files, environment).
//! - [`training`]: the per-epoch driver contract, run traces and metric replay.
//!
//! ```
//! use revision_core::{SchedulerState, ThresholdConfig, ThresholdMethod, ThresholdScheduler};
//!
//! let config = ThresholdConfig::new(ThresholdMethod::Fixed, 0.3, 0.7);
//! let scheduler = ThresholdScheduler::new(&config, 10).unwrap();
//! assert_eq!(scheduler.tau(4, &SchedulerState::new()), 0.3);
//! ```

pub mod config;
pub mod error;
pub mod schedule;
pub mod training;

// Re-exports
pub use config::{RevisionConfig, ThresholdConfig, TrainingConfig, load_config};
pub use error::RevisionError;
pub use schedule::{
    Bounds, CustomRule, Metric, SchedulerState, ThresholdMethod, ThresholdScheduler, clamp,
    progress,
};
pub use training::{
    EpochOutcome, EpochPlan, EpochRecord, EpochTrainer, RecordedMetrics, ReplayTrainer,
    RevisionDriver, ScheduleTrace,
};
