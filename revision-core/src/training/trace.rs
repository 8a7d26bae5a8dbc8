//! Per-run record of scheduled thresholds and observed metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RevisionError;

/// One completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub tau: f64,
    /// Whether samples were filtered by `tau` during this epoch.
    pub revise: bool,
    pub val_loss: f64,
    pub grad_norm: f64,
}

/// Trace of a whole revision run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleTrace {
    pub id: String,
    /// Schedule tag, see [`crate::config::ThresholdConfig::tag`].
    pub tag: String,
    pub method: String,
    pub total_epochs: usize,
    pub started_at: DateTime<Utc>,
    pub records: Vec<EpochRecord>,
}

impl ScheduleTrace {
    pub fn new(tag: &str, method: &str, total_epochs: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tag: tag.to_string(),
            method: method.to_string(),
            total_epochs,
            started_at: Utc::now(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: EpochRecord) {
        self.records.push(record);
    }

    pub fn taus(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.tau).collect()
    }

    /// Epoch with the lowest validation loss.
    pub fn best_epoch(&self) -> Option<&EpochRecord> {
        self.records
            .iter()
            .min_by(|a, b| a.val_loss.total_cmp(&b.val_loss))
    }

    /// Number of epochs that ran with revision active.
    pub fn revised_epochs(&self) -> usize {
        self.records.iter().filter(|r| r.revise).count()
    }

    pub fn is_complete(&self) -> bool {
        self.records.len() >= self.total_epochs
    }

    pub fn to_json(&self) -> Result<String, RevisionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), RevisionError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, RevisionError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(epoch: usize, tau: f64, revise: bool, val_loss: f64) -> EpochRecord {
        EpochRecord {
            epoch,
            tau,
            revise,
            val_loss,
            grad_norm: 1.0,
        }
    }

    #[test]
    fn test_best_epoch_and_counts() {
        let mut trace = ScheduleTrace::new("linear_0.1-0.9", "linear", 3);
        assert!(trace.best_epoch().is_none());
        trace.push(record(0, 0.5, false, 1.2));
        trace.push(record(1, 0.4, true, 0.7));
        assert!(!trace.is_complete());
        trace.push(record(2, 0.3, true, 0.9));
        assert!(trace.is_complete());
        assert_eq!(trace.best_epoch().map(|r| r.epoch), Some(1));
        assert_eq!(trace.revised_epochs(), 2);
        assert_eq!(trace.taus(), vec![0.5, 0.4, 0.3]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("trace.json");
        let mut trace = ScheduleTrace::new("fixed_0.1-0.9", "fixed", 1);
        trace.push(record(0, 0.1, true, 0.5));
        trace.save(&path).unwrap();

        let loaded = ScheduleTrace::load(&path).unwrap();
        assert_eq!(loaded.id, trace.id);
        assert_eq!(loaded.records, trace.records);
    }
}
