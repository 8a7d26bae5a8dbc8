//! Per-epoch history consulted by the threshold scheduler.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Driver-reported metric a feedback policy can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ValLoss,
    GradNorm,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::ValLoss => write!(f, "val_loss"),
            Metric::GradNorm => write!(f, "grad_norm"),
        }
    }
}

/// Append-only training history.
///
/// Created empty at the start of a run and extended by the driver once per
/// epoch, after the scheduler has been consulted for that epoch. Entries are
/// never removed or reordered. The three sequences may have different lengths;
/// policies treat a short sequence as "no prior data".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerState {
    #[serde(default)]
    tau_hist: Vec<f64>,
    #[serde(default)]
    val_loss_hist: Vec<f64>,
    #[serde(default)]
    grad_norm_hist: Vec<f64>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tau(&mut self, tau: f64) {
        self.tau_hist.push(tau);
    }

    pub fn record_val_loss(&mut self, loss: f64) {
        self.val_loss_hist.push(loss);
    }

    pub fn record_grad_norm(&mut self, norm: f64) {
        self.grad_norm_hist.push(norm);
    }

    /// Append one completed epoch: the tau it used and what it measured.
    pub fn record_epoch(&mut self, tau: f64, val_loss: f64, grad_norm: f64) {
        self.record_tau(tau);
        self.record_val_loss(val_loss);
        self.record_grad_norm(grad_norm);
    }

    pub fn tau_hist(&self) -> &[f64] {
        &self.tau_hist
    }

    pub fn val_loss_hist(&self) -> &[f64] {
        &self.val_loss_hist
    }

    pub fn grad_norm_hist(&self) -> &[f64] {
        &self.grad_norm_hist
    }

    pub fn history(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::ValLoss => &self.val_loss_hist,
            Metric::GradNorm => &self.grad_norm_hist,
        }
    }

    /// Most recent tau, if any epoch has completed.
    pub fn last_tau(&self) -> Option<f64> {
        self.tau_hist.last().copied()
    }

    /// `(previous, latest)` values of `metric`, once at least two exist.
    pub fn last_two(&self, metric: Metric) -> Option<(f64, f64)> {
        match self.history(metric) {
            [.., prev, latest] => Some((*prev, *latest)),
            _ => None,
        }
    }

    /// Number of epochs with a recorded tau.
    pub fn epochs(&self) -> usize {
        self.tau_hist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tau_hist.is_empty() && self.val_loss_hist.is_empty() && self.grad_norm_hist.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state() {
        let state = SchedulerState::new();
        assert!(state.is_empty());
        assert_eq!(state.last_tau(), None);
        assert_eq!(state.last_two(Metric::ValLoss), None);
        assert_eq!(state.epochs(), 0);
    }

    #[test]
    fn test_record_epoch_appends_all() {
        let mut state = SchedulerState::new();
        state.record_epoch(0.5, 1.2, 3.0);
        state.record_epoch(0.4, 1.1, 2.5);
        assert_eq!(state.tau_hist(), &[0.5, 0.4]);
        assert_eq!(state.val_loss_hist(), &[1.2, 1.1]);
        assert_eq!(state.grad_norm_hist(), &[3.0, 2.5]);
        assert_eq!(state.last_tau(), Some(0.4));
        assert_eq!(state.epochs(), 2);
    }

    #[test]
    fn test_last_two_needs_two_points() {
        let mut state = SchedulerState::new();
        state.record_val_loss(0.9);
        assert_eq!(state.last_two(Metric::ValLoss), None);
        state.record_val_loss(0.8);
        state.record_val_loss(0.7);
        assert_eq!(state.last_two(Metric::ValLoss), Some((0.8, 0.7)));
        assert_eq!(state.last_two(Metric::GradNorm), None);
    }

    #[test]
    fn test_tolerates_uneven_lengths() {
        let mut state = SchedulerState::new();
        state.record_grad_norm(4.0);
        state.record_grad_norm(3.0);
        assert_eq!(state.last_tau(), None);
        assert_eq!(state.last_two(Metric::GradNorm), Some((4.0, 3.0)));
    }

    #[test]
    fn test_state_deserializes_partial_json() {
        let state: SchedulerState =
            serde_json::from_str(r#"{"tau_hist": [0.3], "val_loss_hist": [1.0, 0.5]}"#).unwrap();
        assert_eq!(state.last_tau(), Some(0.3));
        assert!(state.grad_norm_hist().is_empty());
        assert_eq!(state.last_two(Metric::ValLoss), Some((1.0, 0.5)));
    }

    #[test]
    fn test_metric_display() {
        assert_eq!(Metric::ValLoss.to_string(), "val_loss");
        assert_eq!(Metric::GradNorm.to_string(), "grad_norm");
    }
}
