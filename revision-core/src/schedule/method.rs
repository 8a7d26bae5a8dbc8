//! Catalogue of threshold scheduling methods.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Threshold scheduling method, chosen once at configuration time.
///
/// Parsing never fails: an unrecognized name becomes [`ThresholdMethod::Fallback`],
/// which reports the configured floor on every epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThresholdMethod {
    #[default]
    Fixed,
    Linear,
    Cosine,
    Exp,
    AdaptiveVal,
    AdaptiveGrad,
    Custom,
    Fallback(String),
}

impl ThresholdMethod {
    /// Names accepted by the parser, in catalogue order.
    pub const NAMES: [&'static str; 7] = [
        "fixed",
        "linear",
        "cosine",
        "exp",
        "adaptive_val",
        "adaptive_grad",
        "custom",
    ];

    pub fn name(&self) -> &str {
        match self {
            Self::Fixed => "fixed",
            Self::Linear => "linear",
            Self::Cosine => "cosine",
            Self::Exp => "exp",
            Self::AdaptiveVal => "adaptive_val",
            Self::AdaptiveGrad => "adaptive_grad",
            Self::Custom => "custom",
            Self::Fallback(name) => name,
        }
    }

    /// Whether the method clamps its candidate against the previous tau.
    pub fn is_monotonic(&self) -> bool {
        !matches!(self, Self::Fallback(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

impl fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ThresholdMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "fixed" => Self::Fixed,
            "linear" => Self::Linear,
            "cosine" => Self::Cosine,
            "exp" => Self::Exp,
            "adaptive_val" => Self::AdaptiveVal,
            "adaptive_grad" => Self::AdaptiveGrad,
            "custom" => Self::Custom,
            other => Self::Fallback(other.to_string()),
        })
    }
}

impl From<String> for ThresholdMethod {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(method) => method,
            Err(never) => match never {},
        }
    }
}

impl From<ThresholdMethod> for String {
    fn from(method: ThresholdMethod) -> Self {
        method.name().to_string()
    }
}
