//! Threshold scheduler: maps `(epoch_idx, history)` to the tau for that epoch.
//!
//! Two families of policy are implemented:
//!
//! - **Monotonic** (`fixed`, `linear`, `cosine`, `exp`, `custom`): compute a
//!   candidate from the configured curve, then return `min(candidate, last_tau)`
//!   so the threshold only ever tightens or holds.
//! - **Adaptive** (`adaptive_val`, `adaptive_grad`): step down from `last_tau`
//!   every epoch, taking a larger step when the tracked metric improved.
//!
//! `last_tau` is the latest entry of the tau history, or `tau_min` before the
//! first epoch. Unknown methods report `tau_min` on every call and ignore history.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::config::ThresholdConfig;
use crate::error::RevisionError;
use crate::schedule::bounds::{Bounds, progress};
use crate::schedule::method::ThresholdMethod;
use crate::schedule::state::{Metric, SchedulerState};

/// Minimum drop between the last two metric values that counts as improvement.
pub const IMPROVEMENT_EPS: f64 = 1e-6;

/// Step sizes of an adaptive policy, as fractions of `|tau_max - tau_min|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveSteps {
    /// Applied when the metric decreased by more than [`IMPROVEMENT_EPS`].
    pub fast: f64,
    /// Applied otherwise, including when fewer than two values are recorded.
    pub slow: f64,
}

impl AdaptiveSteps {
    pub const VAL_LOSS: AdaptiveSteps = AdaptiveSteps {
        fast: 0.05,
        slow: 0.02,
    };

    pub const GRAD_NORM: AdaptiveSteps = AdaptiveSteps {
        fast: 0.04,
        slow: 0.04,
    };
}

/// User-supplied candidate rule for the `custom` method.
///
/// The returned candidate is clamped into bounds and then against the previous
/// tau, exactly like the built-in monotonic curves. Non-finite candidates are
/// replaced by `tau_min`.
pub trait CustomRule: Send + Sync {
    fn candidate(&self, epoch_idx: usize, bounds: Bounds, state: &SchedulerState) -> f64;
}

impl<F> CustomRule for F
where
    F: Fn(usize, Bounds, &SchedulerState) -> f64 + Send + Sync,
{
    fn candidate(&self, epoch_idx: usize, bounds: Bounds, state: &SchedulerState) -> f64 {
        self(epoch_idx, bounds, state)
    }
}

/// Policy resolved once from the configured method.
#[derive(Clone)]
enum Policy {
    Fixed,
    Linear,
    Cosine { warmup: usize },
    Exp { k: f64 },
    Adaptive { metric: Metric, fast: f64, slow: f64 },
    Custom(Option<Arc<dyn CustomRule>>),
    Floor,
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Fixed => write!(f, "Fixed"),
            Policy::Linear => write!(f, "Linear"),
            Policy::Cosine { warmup } => f.debug_struct("Cosine").field("warmup", warmup).finish(),
            Policy::Exp { k } => f.debug_struct("Exp").field("k", k).finish(),
            Policy::Adaptive { metric, fast, slow } => f
                .debug_struct("Adaptive")
                .field("metric", metric)
                .field("fast", fast)
                .field("slow", slow)
                .finish(),
            Policy::Custom(rule) => f
                .debug_tuple("Custom")
                .field(&rule.as_ref().map(|_| "<rule>"))
                .finish(),
            Policy::Floor => write!(f, "Floor"),
        }
    }
}

/// Threshold scheduler bound to one validated configuration.
///
/// The scheduler holds no mutable state: the same `(epoch_idx, state)` always
/// yields the same tau.
#[derive(Debug, Clone)]
pub struct ThresholdScheduler {
    method: ThresholdMethod,
    bounds: Bounds,
    total_epochs: usize,
    policy: Policy,
}

impl ThresholdScheduler {
    /// Build a scheduler for a run of `total_epochs` epochs.
    pub fn new(config: &ThresholdConfig, total_epochs: usize) -> Result<Self, RevisionError> {
        config.check()?;

        let bounds = Bounds::new(config.tau_min, config.tau_max);
        let span = bounds.span();
        let policy = match &config.method {
            ThresholdMethod::Fixed => Policy::Fixed,
            ThresholdMethod::Linear => Policy::Linear,
            ThresholdMethod::Cosine => Policy::Cosine {
                warmup: config.cosine_warmup_epochs,
            },
            ThresholdMethod::Exp => Policy::Exp { k: config.exp_k },
            ThresholdMethod::AdaptiveVal => Policy::Adaptive {
                metric: Metric::ValLoss,
                fast: AdaptiveSteps::VAL_LOSS.fast * span,
                slow: AdaptiveSteps::VAL_LOSS.slow * span,
            },
            ThresholdMethod::AdaptiveGrad => Policy::Adaptive {
                metric: Metric::GradNorm,
                fast: AdaptiveSteps::GRAD_NORM.fast * span,
                slow: AdaptiveSteps::GRAD_NORM.slow * span,
            },
            ThresholdMethod::Custom => Policy::Custom(None),
            ThresholdMethod::Fallback(name) => {
                tracing::warn!(method = %name, "Unknown threshold method, using fixed floor");
                Policy::Floor
            }
        };

        Ok(Self {
            method: config.method.clone(),
            bounds,
            total_epochs,
            policy,
        })
    }

    /// Install the rule used by the `custom` method.
    ///
    /// Has no effect for other methods.
    pub fn with_custom_rule(mut self, rule: impl CustomRule + 'static) -> Self {
        if let Policy::Custom(slot) = &mut self.policy {
            *slot = Some(Arc::new(rule));
        }
        self
    }

    pub fn method(&self) -> &ThresholdMethod {
        &self.method
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn total_epochs(&self) -> usize {
        self.total_epochs
    }

    /// Tau the previous epoch used, or `tau_min` before the first epoch.
    ///
    /// A non-finite entry counts as missing.
    fn last_tau(&self, state: &SchedulerState) -> f64 {
        state
            .last_tau()
            .filter(|tau| tau.is_finite())
            .unwrap_or(self.bounds.start)
    }

    /// Value the policy proposes for `epoch_idx` before the running
    /// non-increasing clamp against the tau history.
    ///
    /// Always inside the configured bounds.
    pub fn candidate(&self, epoch_idx: usize, state: &SchedulerState) -> f64 {
        let b = self.bounds;
        match &self.policy {
            Policy::Fixed | Policy::Floor | Policy::Custom(None) => b.clamp(b.start),
            Policy::Linear => b.lerp(progress(epoch_idx, self.total_epochs)),
            Policy::Cosine { warmup } => {
                let warmup = *warmup;
                if warmup > 0 && epoch_idx < warmup {
                    return b.lerp(epoch_idx as f64 / warmup as f64);
                }
                let denom = self.total_epochs.saturating_sub(warmup).max(1);
                let t = ((epoch_idx - warmup) as f64 / denom as f64).clamp(0.0, 1.0);
                b.lerp(0.5 * (1.0 - (PI * t).cos()))
            }
            Policy::Exp { k } => {
                let p = progress(epoch_idx, self.total_epochs);
                b.lerp(1.0 - (-k * p).exp())
            }
            Policy::Adaptive { metric, fast, slow } => {
                let improved = state
                    .last_two(*metric)
                    .is_some_and(|(prev, latest)| latest < prev - IMPROVEMENT_EPS);
                let step = if improved { *fast } else { *slow };
                b.clamp(self.last_tau(state) - step)
            }
            Policy::Custom(Some(rule)) => {
                let value = rule.candidate(epoch_idx, b, state);
                if value.is_finite() {
                    b.clamp(value)
                } else {
                    b.clamp(b.start)
                }
            }
        }
    }

    /// Tau for `epoch_idx` given the history of all prior epochs.
    ///
    /// The result is always inside the order-normalized `[tau_min, tau_max]`.
    pub fn tau(&self, epoch_idx: usize, state: &SchedulerState) -> f64 {
        let candidate = self.candidate(epoch_idx, state);
        let tau = if self.method.is_monotonic() {
            self.bounds.clamp(candidate.min(self.last_tau(state)))
        } else {
            candidate
        };

        tracing::debug!(
            method = %self.method,
            epoch = epoch_idx,
            candidate,
            tau,
            "Scheduled threshold"
        );
        tau
    }
}
