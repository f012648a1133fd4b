use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::HazardThresholds;

/// Risk tier for a predicted PM2.5 concentration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HazardLevel {
    Safe,
    Moderate,
    Hazardous,
}

impl HazardLevel {
    /// Below `moderate` is safe, above `hazardous` is hazardous, both bounds
    /// themselves are moderate
    pub fn classify(predicted_pm25: f64, thresholds: &HazardThresholds) -> Self {
        if predicted_pm25 > thresholds.hazardous {
            HazardLevel::Hazardous
        } else if predicted_pm25 >= thresholds.moderate {
            HazardLevel::Moderate
        } else {
            HazardLevel::Safe
        }
    }

    /// Absent predictions have no tier
    pub fn classify_optional(
        predicted_pm25: Option<f64>,
        thresholds: &HazardThresholds,
    ) -> Option<Self> {
        predicted_pm25.map(|value| Self::classify(value, thresholds))
    }

    pub fn label(&self) -> &'static str {
        match self {
            HazardLevel::Safe => "SAFE",
            HazardLevel::Moderate => "MODERATE",
            HazardLevel::Hazardous => "HAZARDOUS",
        }
    }

    /// Map marker color used by the presentation layer
    pub fn color(&self) -> &'static str {
        match self {
            HazardLevel::Safe => "green",
            HazardLevel::Moderate => "orange",
            HazardLevel::Hazardous => "red",
        }
    }
}

impl fmt::Display for HazardLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
