//! CLI subcommand handlers.

use crate::{Commands, ConfigAction, ScheduleOverrides};
use revision_core::{
    RecordedMetrics, ReplayTrainer, RevisionConfig, RevisionDriver, ScheduleTrace,
    SchedulerState, ThresholdScheduler,
};
use serde::Serialize;
use std::path::Path;

/// Handle a CLI subcommand.
pub fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Schedule { overrides, json } => handle_schedule(&overrides, json, workspace),
        Commands::Replay {
            history,
            overrides,
            out,
            json,
        } => handle_replay(&history, &overrides, out.as_deref(), json, workspace),
        Commands::Config { action } => handle_config(action, workspace),
    }
}

/// Loaded config with command line overrides applied. Not validated yet.
fn resolve_config(
    workspace: &Path,
    overrides: &ScheduleOverrides,
) -> anyhow::Result<RevisionConfig> {
    let mut config = revision_core::load_config(Some(workspace), None)?;
    overrides.apply(&mut config);
    Ok(config)
}

#[derive(Debug, Serialize)]
struct PreviewRow {
    epoch: usize,
    tau: f64,
    revise: bool,
}

/// Tau sequence for a run whose driver never reports metrics.
fn preview(config: &RevisionConfig) -> anyhow::Result<Vec<PreviewRow>> {
    let total_epochs = config.training.total_epochs;
    let scheduler = ThresholdScheduler::new(&config.threshold, total_epochs)?;
    let mut state = SchedulerState::new();
    let mut rows = Vec::with_capacity(total_epochs);
    for epoch in 0..total_epochs {
        let tau = scheduler.tau(epoch, &state);
        state.record_tau(tau);
        rows.push(PreviewRow {
            epoch,
            tau,
            revise: epoch >= config.training.start_revision,
        });
    }
    Ok(rows)
}

fn handle_schedule(
    overrides: &ScheduleOverrides,
    json: bool,
    workspace: &Path,
) -> anyhow::Result<()> {
    let config = resolve_config(workspace, overrides)?;
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }
    let rows = preview(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Schedule {}", config.threshold.tag());
    println!("{:>6}  {:>10}  {}", "epoch", "tau", "revise");
    for row in &rows {
        println!("{:>6}  {:>10.6}  {}", row.epoch, row.tau, row.revise);
    }
    Ok(())
}

/// Replays run for as many epochs as were recorded unless `--epochs` says otherwise.
fn replay_config(
    workspace: &Path,
    overrides: &ScheduleOverrides,
    metrics: &RecordedMetrics,
) -> anyhow::Result<RevisionConfig> {
    let mut config = resolve_config(workspace, overrides)?;
    if !overrides.sets_epochs() {
        config.training.total_epochs = metrics.epochs();
    }
    Ok(config)
}

fn handle_replay(
    history: &Path,
    overrides: &ScheduleOverrides,
    out: Option<&Path>,
    json: bool,
    workspace: &Path,
) -> anyhow::Result<()> {
    let metrics = RecordedMetrics::load(history)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", history.display(), e))?;

    let config = replay_config(workspace, overrides, &metrics)?;

    // Validates (and logs warnings) against the final epoch count.
    let mut driver = RevisionDriver::from_config(&config)?;
    let mut trainer = ReplayTrainer::new(metrics);
    let trace = driver.run(&mut trainer)?;

    if let Some(path) = out {
        trace.save(path)?;
        tracing::info!(path = %path.display(), "Trace written");
    }

    if json {
        println!("{}", trace.to_json()?);
    } else {
        print_trace(trace);
    }
    Ok(())
}

fn print_trace(trace: &ScheduleTrace) {
    println!("Replay {} ({} epochs)", trace.tag, trace.records.len());
    println!(
        "{:>6}  {:>10}  {:>6}  {:>12}  {:>12}",
        "epoch", "tau", "revise", "val_loss", "grad_norm"
    );
    for r in &trace.records {
        println!(
            "{:>6}  {:>10.6}  {:>6}  {:>12.6}  {:>12.6}",
            r.epoch, r.tau, r.revise, r.val_loss, r.grad_norm
        );
    }
    if let Some(best) = trace.best_epoch() {
        println!(
            "Best epoch {} (val_loss {:.6}, tau {:.6})",
            best.epoch, best.val_loss, best.tau
        );
    }
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            match revision_core::config::init_workspace_config(workspace)? {
                Some(path) => println!("Created default configuration at: {}", path.display()),
                None => println!("Configuration file already exists in {}", workspace.display()),
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = revision_core::load_config(Some(workspace), None)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Validate => {
            let config = revision_core::load_config(Some(workspace), None)?;
            config.threshold.check()?;
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid ({})", config.threshold.tag());
            } else {
                for warning in &warnings {
                    println!("warning: {}", warning);
                }
            }
            Ok(())
        }
    }
}
