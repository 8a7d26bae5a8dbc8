//! Scalar helpers shared by every threshold policy.

use serde::{Deserialize, Serialize};

/// Restrict `value` to the closed interval spanned by `low` and `high`.
///
/// The endpoints may be given in either order.
pub fn clamp(value: f64, low: f64, high: f64) -> f64 {
    let lo = low.min(high);
    let hi = low.max(high);
    if value < lo {
        return lo;
    }
    if value > hi {
        return hi;
    }
    value
}

/// Normalized training progress in `[0, 1]`.
///
/// Runs of at most one epoch count as fully advanced. Epoch indices past the
/// planned range (resumed or extended runs) saturate at `1.0`.
pub fn progress(epoch_idx: usize, total_epochs: usize) -> f64 {
    if total_epochs <= 1 {
        return 1.0;
    }
    clamp(epoch_idx as f64 / (total_epochs - 1) as f64, 0.0, 1.0)
}

/// Order-normalized threshold interval.
///
/// `start` and `end` keep the configured `tau_min`/`tau_max` as given so
/// interpolating policies move from `tau_min` towards `tau_max` even when the
/// pair is inverted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub start: f64,
    pub end: f64,
}

impl Bounds {
    pub fn new(tau_min: f64, tau_max: f64) -> Self {
        Self {
            start: tau_min,
            end: tau_max,
        }
    }

    pub fn low(&self) -> f64 {
        self.start.min(self.end)
    }

    pub fn high(&self) -> f64 {
        self.start.max(self.end)
    }

    /// Width of the interval, `|tau_max - tau_min|`.
    pub fn span(&self) -> f64 {
        (self.end - self.start).abs()
    }

    pub fn clamp(&self, value: f64) -> f64 {
        clamp(value, self.start, self.end)
    }

    /// Point at fraction `frac` of the way from `tau_min` to `tau_max`, clamped.
    pub fn lerp(&self, frac: f64) -> f64 {
        self.clamp(self.start + (self.end - self.start) * frac)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low() && value <= self.high()
    }
}
