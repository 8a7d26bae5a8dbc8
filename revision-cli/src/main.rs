//! Revision CLI — preview and replay threshold schedules for selective-revision training.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Revision: threshold schedules for selective-revision training
#[derive(Parser, Debug)]
#[command(name = "revision", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (reads `.revision/config.toml`)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Print the tau sequence a schedule produces without metric feedback
    Schedule {
        #[command(flatten)]
        overrides: ScheduleOverrides,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run the driver over recorded validation losses and gradient norms
    Replay {
        /// JSON file with `val_loss` and `grad_norm` arrays
        history: PathBuf,
        #[command(flatten)]
        overrides: ScheduleOverrides,
        /// Write the resulting trace to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Emit the trace as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Create a default `.revision/config.toml` in the workspace
    Init,
    /// Show the resolved configuration
    Show,
    /// Check the resolved configuration and list warnings
    Validate,
}

/// Command line overrides applied on top of the loaded configuration.
#[derive(clap::Args, Debug, Default, Clone)]
pub(crate) struct ScheduleOverrides {
    /// Threshold method: fixed, linear, cosine, exp, adaptive_val, adaptive_grad, custom
    #[arg(long)]
    method: Option<String>,

    /// Minimum (starting) tau
    #[arg(long = "tau-min", allow_negative_numbers = true)]
    tau_min: Option<f64>,

    /// Maximum tau
    #[arg(long = "tau-max", allow_negative_numbers = true)]
    tau_max: Option<f64>,

    /// Planned number of epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Warmup epochs for the cosine method
    #[arg(long = "cosine-warmup-epochs")]
    warmup: Option<usize>,

    /// Sharpness of the exp method
    #[arg(long = "exp-k")]
    exp_k: Option<f64>,

    /// First epoch with revision active
    #[arg(long = "start-revision")]
    start_revision: Option<usize>,
}

impl ScheduleOverrides {
    pub(crate) fn apply(&self, config: &mut revision_core::RevisionConfig) {
        if let Some(method) = &self.method {
            config.threshold.method = revision_core::ThresholdMethod::from(method.clone());
        }
        if let Some(tau_min) = self.tau_min {
            config.threshold.tau_min = tau_min;
        }
        if let Some(tau_max) = self.tau_max {
            config.threshold.tau_max = tau_max;
        }
        if let Some(epochs) = self.epochs {
            config.training.total_epochs = epochs;
        }
        if let Some(warmup) = self.warmup {
            config.threshold.cosine_warmup_epochs = warmup;
        }
        if let Some(exp_k) = self.exp_k {
            config.threshold.exp_k = exp_k;
        }
        if let Some(start) = self.start_revision {
            config.training.start_revision = start;
        }
    }

    pub(crate) fn sets_epochs(&self) -> bool {
        self.epochs.is_some()
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let log_dir = revision_core::config::project_dirs()
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "revision.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace)
}
