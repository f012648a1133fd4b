use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analyzers::hazard::HazardLevel;
use crate::config::HazardThresholds;
use crate::models::{CleanedTable, ObservationRecord};

/// Headline numbers for the selected point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMetrics {
    pub predicted_pm25: Option<f64>,
    pub actual_pm25: Option<f64>,
    pub error: Option<f64>,
    pub hazard: Option<HazardLevel>,
}

impl PointMetrics {
    pub fn from_record(record: &ObservationRecord, thresholds: &HazardThresholds) -> Self {
        Self {
            predicted_pm25: record.predicted_pm25,
            actual_pm25: record.actual_pm25,
            error: record.metrics.map(|m| m.error),
            hazard: HazardLevel::classify_optional(record.predicted_pm25, thresholds),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardCounts {
    pub safe: usize,
    pub moderate: usize,
    pub hazardous: usize,
}

impl HazardCounts {
    fn add(&mut self, level: HazardLevel) {
        match level {
            HazardLevel::Safe => self.safe += 1,
            HazardLevel::Moderate => self.moderate += 1,
            HazardLevel::Hazardous => self.hazardous += 1,
        }
    }
}

/// Aggregates over a region slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceSummary {
    pub rows: usize,
    pub rows_with_metrics: usize,
    pub mean_absolute_error: Option<f64>,
    /// Mean signed error; positive means predictions ran low
    pub mean_error: Option<f64>,
    pub max_predicted_pm25: Option<f64>,
    pub hazard_counts: HazardCounts,
}

impl SliceSummary {
    pub fn from_records(records: &[&ObservationRecord], thresholds: &HazardThresholds) -> Self {
        let mut hazard_counts = HazardCounts::default();
        let mut max_predicted: Option<f64> = None;
        let mut abs_sum = 0.0;
        let mut signed_sum = 0.0;
        let mut with_metrics = 0usize;

        for record in records {
            if let Some(predicted) = record.predicted_pm25 {
                hazard_counts.add(HazardLevel::classify(predicted, thresholds));
                max_predicted = Some(max_predicted.map_or(predicted, |m| m.max(predicted)));
            }

            if let Some(metrics) = record.metrics {
                abs_sum += metrics.absolute_error;
                signed_sum += metrics.error;
                with_metrics += 1;
            }
        }

        let mean = |sum: f64| (with_metrics > 0).then(|| sum / with_metrics as f64);

        Self {
            rows: records.len(),
            rows_with_metrics: with_metrics,
            mean_absolute_error: mean(abs_sum),
            mean_error: mean(signed_sum),
            max_predicted_pm25: max_predicted,
            hazard_counts,
        }
    }
}

/// One point of the actual-vs-predicted time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub predicted_pm25: Option<f64>,
    pub actual_pm25: Option<f64>,
}

/// All observations for one location, ordered by date
pub fn location_series(table: &CleanedTable, location: &str) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = table
        .records()
        .iter()
        .filter(|record| record.location_label == location)
        .map(|record| SeriesPoint {
            date: record.date,
            predicted_pm25: record.predicted_pm25,
            actual_pm25: record.actual_pm25,
        })
        .collect();

    // Stable sort keeps table order for duplicate dates
    points.sort_by_key(|point| point.date);
    points
}
