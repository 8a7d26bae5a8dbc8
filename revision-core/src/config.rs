//! Configuration system for threshold scheduling.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/revision/config.toml` and/or `.revision/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::RevisionError;
use crate::schedule::ThresholdMethod;

/// Top-level configuration for a revision training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionConfig {
    /// Threshold schedule configuration.
    #[serde(default)]
    pub threshold: ThresholdConfig,
    /// Run-level training settings the schedule depends on.
    #[serde(default)]
    pub training: TrainingConfig,
}

impl RevisionConfig {
    /// Validate the whole config and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.threshold.validate();

        if self.training.total_epochs == 0 {
            warnings.push("total_epochs is 0; progress is treated as complete".to_string());
        }

        if self.threshold.cosine_warmup_epochs > self.training.total_epochs
            && self.threshold.method == ThresholdMethod::Cosine
        {
            warnings.push(format!(
                "cosine_warmup_epochs ({}) exceeds total_epochs ({}); the cosine phase never starts",
                self.threshold.cosine_warmup_epochs, self.training.total_epochs
            ));
        }

        if self.training.start_revision >= self.training.total_epochs
            && self.training.total_epochs > 0
        {
            warnings.push(format!(
                "start_revision ({}) is not before total_epochs ({}); revision never activates",
                self.training.start_revision, self.training.total_epochs
            ));
        }

        warnings
    }
}

/// Threshold (tau) schedule configuration. Immutable once training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Scheduling method; unknown names fall back to the fixed floor.
    #[serde(default)]
    pub method: ThresholdMethod,
    /// Starting (floor) threshold.
    #[serde(default = "default_tau_min")]
    pub tau_min: f64,
    /// Ceiling threshold. May be smaller than `tau_min`; the interval is order-normalized.
    #[serde(default = "default_tau_max")]
    pub tau_max: f64,
    /// Linear warmup length for the `cosine` method.
    #[serde(default)]
    pub cosine_warmup_epochs: usize,
    /// Sharpness of the `exp` method.
    #[serde(default = "default_exp_k")]
    pub exp_k: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::default(),
            tau_min: default_tau_min(),
            tau_max: default_tau_max(),
            cosine_warmup_epochs: 0,
            exp_k: default_exp_k(),
        }
    }
}

fn default_tau_min() -> f64 {
    0.1
}

fn default_tau_max() -> f64 {
    0.9
}

fn default_exp_k() -> f64 {
    5.0
}

fn exp_k_is_valid(k: f64) -> bool {
    k.is_finite() && k > 0.0
}

impl ThresholdConfig {
    pub fn new(method: ThresholdMethod, tau_min: f64, tau_max: f64) -> Self {
        Self {
            method,
            tau_min,
            tau_max,
            ..Self::default()
        }
    }

    /// Reject values the configured method cannot work with.
    pub fn check(&self) -> Result<(), RevisionError> {
        if !self.tau_min.is_finite() || !self.tau_max.is_finite() {
            return Err(RevisionError::config(format!(
                "tau bounds must be finite (tau_min={}, tau_max={})",
                self.tau_min, self.tau_max
            )));
        }
        if self.method == ThresholdMethod::Exp && !exp_k_is_valid(self.exp_k) {
            return Err(RevisionError::config(format!(
                "exp_k must be a positive finite number, got {}",
                self.exp_k
            )));
        }
        Ok(())
    }

    /// Validate this config and return any warnings.
    ///
    /// Returns an empty Vec if the config is valid. Warnings describe values that
    /// are accepted but probably not what was intended.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let ThresholdMethod::Fallback(name) = &self.method {
            warnings.push(format!(
                "unknown threshold method '{}'; tau stays at tau_min ({}). Known methods: {}",
                name,
                self.tau_min,
                ThresholdMethod::NAMES.join(", ")
            ));
        }

        if self.tau_min > self.tau_max {
            warnings.push(format!(
                "tau_min ({}) is greater than tau_max ({}); bounds are used in normalized order",
                self.tau_min, self.tau_max
            ));
        }

        if self.tau_min == self.tau_max {
            warnings.push(format!(
                "tau_min equals tau_max ({}); every method yields a constant tau",
                self.tau_min
            ));
        }

        if self.method != ThresholdMethod::Exp && !exp_k_is_valid(self.exp_k) {
            warnings.push(format!(
                "exp_k ({}) is not a positive finite number; ignored by the '{}' method",
                self.exp_k, self.method
            ));
        }

        if self.cosine_warmup_epochs > 0 && self.method != ThresholdMethod::Cosine {
            warnings.push(format!(
                "cosine_warmup_epochs is ignored by the '{}' method",
                self.method
            ));
        }

        warnings
    }

    /// Short tag identifying the schedule, used to name trained-model artifacts.
    pub fn tag(&self) -> String {
        format!("{}_{:?}-{:?}", self.method, self.tau_min, self.tau_max)
    }
}

/// Training run settings consumed by the scheduler and driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Planned number of epochs, used to normalize progress.
    #[serde(default = "default_total_epochs")]
    pub total_epochs: usize,
    /// First epoch at which samples are filtered by tau.
    #[serde(default)]
    pub start_revision: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            total_epochs: default_total_epochs(),
            start_revision: 0,
        }
    }
}

fn default_total_epochs() -> usize {
    10
}

/// Platform directories for revision (`~/.config/revision`, data dir for logs).
pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "revision", "revision")
}

/// User-level config file, if the platform has a config directory.
fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".revision").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `REVISION_`, `__` between tables)
/// 3. Workspace-local config (`.revision/config.toml`)
/// 4. User config (`~/.config/revision/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&RevisionConfig>,
) -> Result<RevisionConfig, RevisionError> {
    let files = user_config_path()
        .into_iter()
        .chain(workspace.map(workspace_config_path))
        .filter(|path| path.exists());

    let mut figment = files.fold(
        Figment::from(Serialized::defaults(RevisionConfig::default())),
        |figment, path| figment.merge(Toml::file(path)),
    );

    // REVISION_THRESHOLD__METHOD, REVISION_TRAINING__TOTAL_EPOCHS, ...
    figment = figment.merge(Env::prefixed("REVISION_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment
        .extract()
        .map_err(|e| RevisionError::from(Box::new(e)))
}

/// Check whether any configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    user_config_path()
        .into_iter()
        .chain(workspace.map(workspace_config_path))
        .any(|path| path.exists())
}

/// Write the default configuration to `<workspace>/.revision/config.toml`.
///
/// Returns the path written, or `None` if a config file already exists there.
pub fn init_workspace_config(workspace: &Path) -> Result<Option<PathBuf>, RevisionError> {
    let config_path = workspace_config_path(workspace);
    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    if config_path.exists() {
        return Ok(None);
    }

    let toml_str = toml::to_string_pretty(&RevisionConfig::default())
        .map_err(|e| RevisionError::config(e.to_string()))?;
    std::fs::write(&config_path, toml_str)?;
    Ok(Some(config_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_threshold_defaults() {
        let config = ThresholdConfig::default();
        assert_eq!(config.method, ThresholdMethod::Fixed);
        assert_eq!(config.tau_min, 0.1);
        assert_eq!(config.tau_max, 0.9);
        assert_eq!(config.cosine_warmup_epochs, 0);
        assert_eq!(config.exp_k, 5.0);
        assert!(config.validate().is_empty());
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_check_rejects_bad_exp_k() {
        let mut config = ThresholdConfig::new(ThresholdMethod::Exp, 0.1, 0.9);
        config.exp_k = 0.0;
        assert!(matches!(config.check(), Err(RevisionError::Config(_))));
        config.exp_k = f64::NAN;
        assert!(config.check().is_err());
    }

    #[test]
    fn test_exp_k_only_checked_for_exp() {
        for method in [ThresholdMethod::Fixed, ThresholdMethod::Linear] {
            let mut config = ThresholdConfig::new(method, 0.1, 0.9);
            config.exp_k = 0.0;
            assert!(config.check().is_ok());
            let warnings = config.validate();
            assert_eq!(warnings.len(), 1);
            assert!(warnings[0].contains("exp_k (0)"));
        }
    }

    #[test]
    fn test_check_rejects_non_finite_bounds() {
        let config = ThresholdConfig::new(ThresholdMethod::Linear, f64::INFINITY, 0.9);
        assert!(config.check().is_err());
    }

    #[test]
    fn test_validate_warnings() {
        let mut config = ThresholdConfig::new(ThresholdMethod::Fallback("step".into()), 0.9, 0.1);
        config.cosine_warmup_epochs = 3;
        let warnings = config.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("unknown threshold method 'step'"));
        assert!(warnings[1].contains("greater than tau_max"));
        assert!(warnings[2].contains("ignored"));
    }

    #[test]
    fn test_revision_config_warnings() {
        let mut config = RevisionConfig::default();
        config.threshold.method = ThresholdMethod::Cosine;
        config.threshold.cosine_warmup_epochs = 20;
        config.training.start_revision = 10;
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("cosine phase never starts")));
        assert!(warnings.iter().any(|w| w.contains("revision never activates")));
    }

    #[test]
    fn test_tag_format() {
        let config = ThresholdConfig::new(ThresholdMethod::Linear, 0.1, 0.9);
        assert_eq!(config.tag(), "linear_0.1-0.9");
        let config = ThresholdConfig::new(ThresholdMethod::AdaptiveVal, 0.0, 1.0);
        assert_eq!(config.tag(), "adaptive_val_0.0-1.0");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = RevisionConfig::default();
        config.threshold.method = ThresholdMethod::Exp;
        config.threshold.exp_k = 3.5;
        config.training.total_epochs = 40;
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: RevisionConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RevisionConfig = toml::from_str(
            r#"
[threshold]
method = "cosine"
cosine_warmup_epochs = 2
"#,
        )
        .unwrap();
        assert_eq!(config.threshold.method, ThresholdMethod::Cosine);
        assert_eq!(config.threshold.cosine_warmup_epochs, 2);
        assert_eq!(config.threshold.tau_max, 0.9);
        assert_eq!(config.training.total_epochs, 10);
    }

    #[test]
    fn test_load_config_with_overrides() {
        let mut overrides = RevisionConfig::default();
        overrides.threshold.method = ThresholdMethod::AdaptiveGrad;
        overrides.training.total_epochs = 50;

        let config = load_config(None, Some(&overrides)).unwrap();
        assert_eq!(config.threshold.method, ThresholdMethod::AdaptiveGrad);
        assert_eq!(config.training.total_epochs, 50);
    }

    #[test]
    fn test_load_config_from_workspace() {
        figment::Jail::expect_with(|jail| {
            let config_dir = jail.directory().join(".revision");
            std::fs::create_dir_all(&config_dir).unwrap();
            std::fs::write(
                config_dir.join("config.toml"),
                r#"
[threshold]
method = "linear"
tau_min = 0.2
tau_max = 0.8

[training]
total_epochs = 30
start_revision = 5
"#,
            )
            .unwrap();

            assert!(config_exists(Some(jail.directory())));
            let config = load_config(Some(jail.directory()), None).map_err(|e| e.to_string())?;
            assert_eq!(config.threshold.method, ThresholdMethod::Linear);
            assert_eq!(config.threshold.tau_min, 0.2);
            assert_eq!(config.threshold.tau_max, 0.8);
            assert_eq!(config.training.total_epochs, 30);
            assert_eq!(config.training.start_revision, 5);
            Ok(())
        });
    }

    #[test]
    fn test_load_config_from_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("REVISION_THRESHOLD__METHOD", "linear");
            jail.set_env("REVISION_THRESHOLD__TAU_MIN", "1");
            jail.set_env("REVISION_TRAINING__START_REVISION", "3");

            let config = load_config(Some(jail.directory()), None).map_err(|e| e.to_string())?;
            assert_eq!(config.threshold.method, ThresholdMethod::Linear);
            assert_eq!(config.threshold.tau_min, 1.0);
            assert_eq!(config.threshold.tau_max, 0.9);
            assert_eq!(config.training.start_revision, 3);
            Ok(())
        });
    }

    #[test]
    fn test_load_config_reports_bad_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("REVISION_TRAINING__TOTAL_EPOCHS", "many");
            let err = load_config(Some(jail.directory()), None).unwrap_err();
            assert!(matches!(err, RevisionError::Figment(_)));
            Ok(())
        });
    }

    #[test]
    fn test_init_workspace_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_workspace_config(dir.path()).unwrap();
        assert!(path.is_some());
        let written: RevisionConfig =
            toml::from_str(&std::fs::read_to_string(path.unwrap()).unwrap()).unwrap();
        assert_eq!(written, RevisionConfig::default());
        assert!(init_workspace_config(dir.path()).unwrap().is_none());
    }
}
