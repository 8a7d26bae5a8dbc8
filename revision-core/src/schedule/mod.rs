//! Threshold scheduling: bounds helpers, training history and the policy catalogue.

pub mod bounds;
pub mod method;
pub mod scheduler;
pub mod state;

pub use bounds::{Bounds, clamp, progress};
pub use method::ThresholdMethod;
pub use scheduler::{AdaptiveSteps, CustomRule, IMPROVEMENT_EPS, ThresholdScheduler};
pub use state::{Metric, SchedulerState};
