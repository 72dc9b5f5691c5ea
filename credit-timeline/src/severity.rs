use serde::{Deserialize, Serialize};
use std::fmt;

pub const CRITICAL_THRESHOLD: f64 = 0.8;
pub const HIGH_THRESHOLD: f64 = 0.5;
pub const MODERATE_THRESHOLD: f64 = 0.3;

/// Coarse utilization tier.
///
/// Ordered from lowest to highest: Low < Moderate < High < Critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a utilization ratio. Each threshold belongs to the higher tier;
/// anything that is not at least 0.3, NaN included, is low.
pub fn classify(utilization: f64) -> Severity {
    if utilization >= CRITICAL_THRESHOLD {
        Severity::Critical
    } else if utilization >= HIGH_THRESHOLD {
        Severity::High
    } else if utilization >= MODERATE_THRESHOLD {
        Severity::Moderate
    } else {
        Severity::Low
    }
}
