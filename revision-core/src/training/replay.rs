//! Replay recorded metrics through a different threshold schedule.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RevisionError;
use crate::training::driver::{EpochOutcome, EpochPlan, EpochTrainer};

/// Metrics logged by a previous run, one entry per epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedMetrics {
    #[serde(default)]
    pub val_loss: Vec<f64>,
    #[serde(default)]
    pub grad_norm: Vec<f64>,
}

impl RecordedMetrics {
    pub fn load(path: &Path) -> Result<Self, RevisionError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Number of epochs for which both metrics were recorded.
    pub fn epochs(&self) -> usize {
        self.val_loss.len().min(self.grad_norm.len())
    }
}

/// Trainer that answers each epoch from [`RecordedMetrics`] instead of training.
#[derive(Debug, Clone)]
pub struct ReplayTrainer {
    metrics: RecordedMetrics,
}

impl ReplayTrainer {
    pub fn new(metrics: RecordedMetrics) -> Self {
        if metrics.val_loss.len() != metrics.grad_norm.len() {
            tracing::warn!(
                val_loss = metrics.val_loss.len(),
                grad_norm = metrics.grad_norm.len(),
                "Recorded metrics have different lengths; replay stops at the shorter one"
            );
        }
        Self { metrics }
    }

    pub fn epochs(&self) -> usize {
        self.metrics.epochs()
    }
}

impl EpochTrainer for ReplayTrainer {
    fn run_epoch(&mut self, plan: &EpochPlan) -> Result<EpochOutcome, RevisionError> {
        let val_loss = self.metrics.val_loss.get(plan.epoch).copied();
        let grad_norm = self.metrics.grad_norm.get(plan.epoch).copied();
        match (val_loss, grad_norm) {
            (Some(val_loss), Some(grad_norm)) => Ok(EpochOutcome {
                val_loss,
                grad_norm,
            }),
            _ => Err(RevisionError::invalid_input(format!(
                "no recorded metrics for epoch {} ({} epochs available)",
                plan.epoch,
                self.epochs()
            ))),
        }
    }
}
