//! Revision driver: consults the scheduler, runs an epoch, records its history.
//!
//! Per epoch, in this order:
//! 1. compute tau from the history of all prior epochs,
//! 2. hand the resulting [`EpochPlan`] to the trainer,
//! 3. append the epoch's tau, validation loss and gradient norm.
//!
//! Appending before consulting would shift `last_tau` by one epoch, so the
//! driver is the only writer of [`SchedulerState`].

use crate::config::RevisionConfig;
use crate::error::RevisionError;
use crate::schedule::{SchedulerState, ThresholdScheduler};
use crate::training::trace::{EpochRecord, ScheduleTrace};

/// What the trainer receives for one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochPlan {
    pub epoch: usize,
    /// Admission threshold for this epoch.
    pub tau: f64,
    /// False before `start_revision`: every sample is trained on and `tau` is advisory.
    pub revise: bool,
}

/// What the trainer reports after one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochOutcome {
    pub val_loss: f64,
    pub grad_norm: f64,
}

/// The external training step: admission, forward/backward and validation.
pub trait EpochTrainer {
    fn run_epoch(&mut self, plan: &EpochPlan) -> Result<EpochOutcome, RevisionError>;
}

impl<F> EpochTrainer for F
where
    F: FnMut(&EpochPlan) -> Result<EpochOutcome, RevisionError>,
{
    fn run_epoch(&mut self, plan: &EpochPlan) -> Result<EpochOutcome, RevisionError> {
        self(plan)
    }
}

/// Owns the schedule history for one training run.
#[derive(Debug)]
pub struct RevisionDriver {
    scheduler: ThresholdScheduler,
    state: SchedulerState,
    start_revision: usize,
    next_epoch: usize,
    trace: ScheduleTrace,
}

impl RevisionDriver {
    pub fn new(scheduler: ThresholdScheduler, start_revision: usize, tag: &str) -> Self {
        let trace = ScheduleTrace::new(tag, scheduler.method().name(), scheduler.total_epochs());
        Self {
            scheduler,
            state: SchedulerState::new(),
            start_revision,
            next_epoch: 0,
            trace,
        }
    }

    /// Build the scheduler from a loaded config and wrap it in a driver.
    pub fn from_config(config: &RevisionConfig) -> Result<Self, RevisionError> {
        for warning in config.validate() {
            tracing::warn!("{}", warning);
        }
        let scheduler = ThresholdScheduler::new(&config.threshold, config.training.total_epochs)?;
        Ok(Self::new(
            scheduler,
            config.training.start_revision,
            &config.threshold.tag(),
        ))
    }

    pub fn scheduler(&self) -> &ThresholdScheduler {
        &self.scheduler
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn trace(&self) -> &ScheduleTrace {
        &self.trace
    }

    pub fn into_trace(self) -> ScheduleTrace {
        self.trace
    }

    /// Index of the epoch the next call to [`step`](Self::step) will run.
    pub fn next_epoch(&self) -> usize {
        self.next_epoch
    }

    pub fn is_finished(&self) -> bool {
        self.next_epoch >= self.scheduler.total_epochs()
    }

    /// Plan for the upcoming epoch. Does not advance the driver.
    pub fn plan(&self) -> EpochPlan {
        let epoch = self.next_epoch;
        EpochPlan {
            epoch,
            tau: self.scheduler.tau(epoch, &self.state),
            revise: epoch >= self.start_revision,
        }
    }

    /// Run exactly one epoch.
    ///
    /// Non-finite or negative metrics are rejected before anything is recorded,
    /// leaving the history as it was.
    pub fn step<T>(&mut self, trainer: &mut T) -> Result<EpochRecord, RevisionError>
    where
        T: EpochTrainer + ?Sized,
    {
        let plan = self.plan();
        let outcome = trainer.run_epoch(&plan)?;

        if !outcome.val_loss.is_finite() {
            return Err(RevisionError::history(format!(
                "epoch {} reported non-finite validation loss {}",
                plan.epoch, outcome.val_loss
            )));
        }
        if !outcome.grad_norm.is_finite() || outcome.grad_norm < 0.0 {
            return Err(RevisionError::history(format!(
                "epoch {} reported invalid gradient norm {}",
                plan.epoch, outcome.grad_norm
            )));
        }

        self.state
            .record_epoch(plan.tau, outcome.val_loss, outcome.grad_norm);
        let record = EpochRecord {
            epoch: plan.epoch,
            tau: plan.tau,
            revise: plan.revise,
            val_loss: outcome.val_loss,
            grad_norm: outcome.grad_norm,
        };
        self.trace.push(record.clone());
        self.next_epoch += 1;

        tracing::info!(
            epoch = plan.epoch,
            tau = plan.tau,
            revise = plan.revise,
            val_loss = outcome.val_loss,
            grad_norm = outcome.grad_norm,
            "Epoch complete"
        );
        Ok(record)
    }

    /// Run the remaining epochs of the plan.
    pub fn run<T>(&mut self, trainer: &mut T) -> Result<&ScheduleTrace, RevisionError>
    where
        T: EpochTrainer + ?Sized,
    {
        while !self.is_finished() {
            self.step(trainer)?;
        }
        tracing::info!(
            tag = %self.trace.tag,
            epochs = self.trace.records.len(),
            revised = self.trace.revised_epochs(),
            "Revision run finished"
        );
        Ok(&self.trace)
    }
}
