use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ObservationRecord;

/// Which optional column groups the source carried
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub region: bool,
    pub predicted: bool,
    pub actual: bool,
    pub smoke_yesterday: bool,
    pub velocity_yesterday: bool,
    pub pm25_3day_avg: bool,
    pub pm25_yesterday: bool,
}

impl Capabilities {
    /// Error metrics exist only when both pollutant columns do
    pub fn has_error_metrics(&self) -> bool {
        self.predicted && self.actual
    }

    pub fn has_narrative_features(&self) -> bool {
        self.smoke_yesterday || self.velocity_yesterday
    }
}

/// The cleaned, immutable table handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedTable {
    headers: Vec<String>,
    records: Vec<ObservationRecord>,
    capabilities: Capabilities,
}

impl CleanedTable {
    pub fn new(
        headers: Vec<String>,
        records: Vec<ObservationRecord>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            headers,
            records,
            capabilities,
        }
    }

    /// Trimmed header names, in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest observation date
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    pub fn distinct_dates(&self) -> BTreeSet<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    pub fn distinct_locations(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .map(|r| r.location_label.as_str())
            .collect()
    }

    pub fn distinct_regions(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.region.as_str()).collect()
    }
}
