use serde::{Deserialize, Serialize};

use crate::models::{Capabilities, ObservationRecord};
use crate::utils::constants::{RAPID_RISE_VELOCITY, SMOKE_PLUME_THRESHOLD};

/// Narrative verdict for the "why is the air bad?" panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverInsight {
    SmokePlume,
    RapidRise,
    Stable,
}

impl DriverInsight {
    pub fn message(&self) -> &'static str {
        match self {
            DriverInsight::SmokePlume => {
                "Significant smoke plumes were detected yesterday, driving the risk up."
            }
            DriverInsight::RapidRise => {
                "Pollution is rising rapidly (high velocity), suggesting a new ignition."
            }
            DriverInsight::Stable => "Factors suggest stable atmospheric conditions.",
        }
    }
}

/// Feature readings shown next to the verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverNarrative {
    /// Smoke intensity yesterday, on a 0-3 scale
    pub smoke_yesterday: f64,
    /// Rate of change of PM2.5
    pub velocity_yesterday: f64,
    pub pm25_3day_avg: Option<f64>,
    pub pm25_yesterday: Option<f64>,
    pub insight: DriverInsight,
}

impl DriverNarrative {
    /// Build the narrative; `None` when the table carries neither smoke nor
    /// velocity columns. Missing cells count as zero.
    pub fn for_record(record: &ObservationRecord, capabilities: &Capabilities) -> Option<Self> {
        if !capabilities.has_narrative_features() {
            return None;
        }

        let features = record.features;
        let smoke = features.smoke_yesterday.unwrap_or(0.0);
        let velocity = features.velocity_yesterday.unwrap_or(0.0);

        let insight = if smoke > SMOKE_PLUME_THRESHOLD {
            DriverInsight::SmokePlume
        } else if velocity > RAPID_RISE_VELOCITY {
            DriverInsight::RapidRise
        } else {
            DriverInsight::Stable
        };

        Some(Self {
            smoke_yesterday: smoke,
            velocity_yesterday: velocity,
            pm25_3day_avg: features.pm25_3day_avg,
            pm25_yesterday: features.pm25_yesterday,
            insight,
        })
    }
}
