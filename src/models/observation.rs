use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;

/// Signed and absolute prediction error for one observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    /// `actual - predicted`
    pub error: f64,
    pub absolute_error: f64,
}

impl ErrorMetrics {
    pub fn from_pair(predicted: Option<f64>, actual: Option<f64>) -> Option<Self> {
        let (predicted, actual) = (predicted?, actual?);
        let error = actual - predicted;

        Some(Self {
            error,
            absolute_error: error.abs(),
        })
    }
}

/// Auxiliary model inputs, used only for narrative text
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureValues {
    pub smoke_yesterday: Option<f64>,
    pub velocity_yesterday: Option<f64>,
    pub pm25_3day_avg: Option<f64>,
    pub pm25_yesterday: Option<f64>,
}

impl FeatureValues {
    pub fn is_empty(&self) -> bool {
        self.smoke_yesterday.is_none()
            && self.velocity_yesterday.is_none()
            && self.pm25_3day_avg.is_none()
            && self.pm25_yesterday.is_none()
    }
}

/// One cleaned row: a sensor location on a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ObservationRecord {
    /// 1-based data row in the source file
    pub line: usize,

    pub date: NaiveDate,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub location_label: String,

    pub state_id: Option<u32>,

    pub region: String,

    pub predicted_pm25: Option<f64>,

    pub actual_pm25: Option<f64>,

    pub metrics: Option<ErrorMetrics>,

    pub features: FeatureValues,
}

impl ObservationRecord {
    pub fn new(
        line: usize,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
        location_label: String,
        region: String,
    ) -> Self {
        Self {
            line,
            date,
            latitude,
            longitude,
            location_label,
            state_id: None,
            region,
            predicted_pm25: None,
            actual_pm25: None,
            metrics: None,
            features: FeatureValues::default(),
        }
    }

    pub fn with_state_id(mut self, state_id: Option<u32>) -> Self {
        self.state_id = state_id;
        self
    }

    /// Attach pollutant readings and recompute the derived error metrics
    pub fn with_pollutants(mut self, predicted: Option<f64>, actual: Option<f64>) -> Self {
        self.predicted_pm25 = predicted;
        self.actual_pm25 = actual;
        self.metrics = ErrorMetrics::from_pair(predicted, actual);
        self
    }

    pub fn with_features(mut self, features: FeatureValues) -> Self {
        self.features = features;
        self
    }

    /// Check coordinate ranges
    pub fn validate_coordinates(&self) -> Result<()> {
        self.validate()?;
        Ok(())
    }

    pub fn has_metrics(&self) -> bool {
        self.metrics.is_some()
    }
}
