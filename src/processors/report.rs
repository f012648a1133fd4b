use crate::models::{Capabilities, CleanedTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    InvalidLatitude,
    InvalidLongitude,
    OutOfRange,
}

/// A row removed during coordinate normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRow {
    pub line: usize,
    pub reason: DropReason,
    pub details: String,
}

/// What happened while preparing one source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreparationReport {
    /// Archive entry the CSV came from, if the source was zipped
    pub data_file: Option<String>,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub dropped_rows: Vec<DroppedRow>,
    /// Optional numeric cells that were present but not parseable
    pub unparsed_values: usize,
    pub capabilities: Capabilities,
    pub distinct_dates: usize,
    pub distinct_locations: usize,
    pub distinct_regions: usize,
}

impl PreparationReport {
    pub fn record_table(&mut self, table: &CleanedTable) {
        self.rows_kept = table.len();
        self.capabilities = table.capabilities();
        self.distinct_dates = table.distinct_dates().len();
        self.distinct_locations = table.distinct_locations().len();
        self.distinct_regions = table.distinct_regions().len();
    }

    pub fn rows_dropped(&self) -> usize {
        self.dropped_rows.len()
    }

    /// Generate a human-readable summary
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Data Preparation Report ===\n");
        if let Some(ref data_file) = self.data_file {
            summary.push_str(&format!("Archive Entry: {}\n", data_file));
        }
        summary.push_str(&format!("Rows Read: {}\n", self.rows_read));

        let kept_pct = if self.rows_read == 0 {
            0.0
        } else {
            100.0 * self.rows_kept as f64 / self.rows_read as f64
        };
        summary.push_str(&format!(
            "Rows Kept: {} ({:.1}%)\n",
            self.rows_kept, kept_pct
        ));
        summary.push_str(&format!("Rows Dropped: {}\n", self.rows_dropped()));
        summary.push_str(&format!(
            "Unparsed Optional Values: {}\n",
            self.unparsed_values
        ));
        summary.push_str(&format!(
            "Dates: {}, Locations: {}, Regions: {}\n",
            self.distinct_dates, self.distinct_locations, self.distinct_regions
        ));

        let caps = &self.capabilities;
        summary.push_str("\nAvailable Columns:\n");
        summary.push_str(&format!("  Region IDs: {}\n", yes_no(caps.region)));
        summary.push_str(&format!("  Predicted PM2.5: {}\n", yes_no(caps.predicted)));
        summary.push_str(&format!("  Actual PM2.5: {}\n", yes_no(caps.actual)));
        summary.push_str(&format!(
            "  Error Metrics: {}\n",
            yes_no(caps.has_error_metrics())
        ));
        summary.push_str(&format!(
            "  Narrative Features: {}\n",
            yes_no(caps.has_narrative_features())
        ));

        if !self.dropped_rows.is_empty() {
            summary.push_str("\nFirst 10 Dropped Rows:\n");
            for (i, dropped) in self.dropped_rows.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. Row {}: {}\n",
                    i + 1,
                    dropped.line,
                    dropped.details
                ));
            }
        }

        summary
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
