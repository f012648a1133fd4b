//! The data preparation pipeline.
//!
//! Steps run in a fixed order because each relies on the guarantees of the
//! one before: archive resolution, header trimming, the required-column
//! check, date parsing, coordinate coercion, location labels, region labels
//! and finally error metrics. Structural problems abort the load; bad
//! coordinates only drop their row; missing optional columns only switch off
//! the fields that depend on them.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::archive::resolve_payload;
use crate::config::PipelineOptions;
use crate::error::{ProcessingError, Result};
use crate::models::{
    parse_state_id, region_label, Capabilities, CleanedTable, FeatureValues, ObservationRecord,
};
use crate::processors::report::{DropReason, DroppedRow, PreparationReport};
use crate::readers::{ColumnIndex, CsvTableReader, RawRow};
use crate::utils::coordinates::{location_label, parse_coordinate};
use crate::utils::dates::parse_date;

/// A cleaned table together with the report of how it was produced
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTable {
    pub table: CleanedTable,
    pub report: PreparationReport,
}

pub struct DataPreparer {
    options: PipelineOptions,
    reader: CsvTableReader,
}

impl DataPreparer {
    pub fn new(options: PipelineOptions) -> Self {
        let delimiter = u8::try_from(options.delimiter).unwrap_or_else(|_| {
            warn!(delimiter = %options.delimiter, "Delimiter is not a single byte, using ','");
            b','
        });
        Self {
            options,
            reader: CsvTableReader::with_delimiter(delimiter),
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run the whole pipeline over a CSV payload or a zip archive holding one
    pub fn prepare_bytes(&self, bytes: &[u8]) -> Result<PreparedTable> {
        let payload = resolve_payload(bytes, &self.options.hidden_prefix)?;
        let raw = self.reader.read(&payload.bytes)?;

        let columns = ColumnIndex::resolve(&raw.headers);
        let date_col = columns
            .date
            .ok_or_else(|| ProcessingError::MissingRequiredColumn("date".to_string()))?;
        let lat_col = columns
            .latitude
            .ok_or_else(|| ProcessingError::MissingRequiredColumn("lat".to_string()))?;
        let lon_col = columns
            .longitude
            .ok_or_else(|| ProcessingError::MissingRequiredColumn("lon".to_string()))?;

        let dates = parse_dates(&raw.rows, date_col)?;
        debug!(rows = raw.rows.len(), "Parsed date column");

        let capabilities = Capabilities {
            region: columns.state_id.is_some(),
            predicted: columns.predicted.is_some(),
            actual: columns.actual.is_some(),
            smoke_yesterday: columns.smoke_yesterday.is_some(),
            velocity_yesterday: columns.velocity_yesterday.is_some(),
            pm25_3day_avg: columns.pm25_3day_avg.is_some(),
            pm25_yesterday: columns.pm25_yesterday.is_some(),
        };
        if !capabilities.region {
            debug!(
                fallback = %self.options.fallback_region,
                "No state ID column, all rows share the fallback region"
            );
        }
        if !capabilities.has_error_metrics() {
            debug!("Prediction or actual column missing, error metrics disabled");
        }

        let mut report = PreparationReport {
            data_file: payload.entry_name.clone(),
            rows_read: raw.rows.len(),
            ..Default::default()
        };

        let mut records = Vec::with_capacity(raw.rows.len());
        for (row, date) in raw.rows.iter().zip(dates) {
            let (latitude, longitude) = match read_coordinates(row, lat_col, lon_col) {
                Ok(coordinates) => coordinates,
                Err(dropped) => {
                    warn!(line = dropped.line, details = %dropped.details, "Dropping row");
                    report.dropped_rows.push(dropped);
                    continue;
                }
            };

            let label = location_label(latitude, longitude, self.options.label_precision);
            let state_id = columns
                .state_id
                .and_then(|index| parse_state_id(row.field(index)));
            let region = region_label(state_id, &self.options.fallback_region);

            let mut optional = |index: Option<usize>| {
                parse_optional(row, index, &mut report.unparsed_values)
            };
            let predicted = optional(columns.predicted);
            let actual = optional(columns.actual);
            let features = FeatureValues {
                smoke_yesterday: optional(columns.smoke_yesterday),
                velocity_yesterday: optional(columns.velocity_yesterday),
                pm25_3day_avg: optional(columns.pm25_3day_avg),
                pm25_yesterday: optional(columns.pm25_yesterday),
            };

            let record = ObservationRecord::new(row.line, date, latitude, longitude, label, region)
                .with_state_id(state_id)
                .with_pollutants(predicted, actual)
                .with_features(features);

            if let Err(e) = record.validate_coordinates() {
                let dropped = DroppedRow {
                    line: row.line,
                    reason: DropReason::OutOfRange,
                    details: format!(
                        "Coordinates ({}, {}) out of range: {}",
                        latitude, longitude, e
                    ),
                };
                warn!(line = dropped.line, details = %dropped.details, "Dropping row");
                report.dropped_rows.push(dropped);
                continue;
            }

            records.push(record);
        }

        let table = CleanedTable::new(raw.headers, records, capabilities);
        report.record_table(&table);

        info!(
            rows_read = report.rows_read,
            rows_kept = report.rows_kept,
            rows_dropped = report.rows_dropped(),
            "Prepared observation table"
        );

        Ok(PreparedTable { table, report })
    }
}

impl Default for DataPreparer {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}

/// Parse every date up front; one bad value fails the whole load
fn parse_dates(rows: &[RawRow], date_col: usize) -> Result<Vec<NaiveDate>> {
    rows.iter()
        .map(|row| {
            let value = row.field(date_col);
            parse_date(value).ok_or_else(|| ProcessingError::InvalidDate {
                line: row.line,
                value: value.to_string(),
            })
        })
        .collect()
}

fn read_coordinates(
    row: &RawRow,
    lat_col: usize,
    lon_col: usize,
) -> std::result::Result<(f64, f64), DroppedRow> {
    let latitude = parse_coordinate(row.field(lat_col)).map_err(|e| DroppedRow {
        line: row.line,
        reason: DropReason::InvalidLatitude,
        details: e.to_string(),
    })?;

    let longitude = parse_coordinate(row.field(lon_col)).map_err(|e| DroppedRow {
        line: row.line,
        reason: DropReason::InvalidLongitude,
        details: e.to_string(),
    })?;

    Ok((latitude, longitude))
}

/// Blank and NaN cells are simply absent; anything else unparseable is counted
fn parse_optional(row: &RawRow, index: Option<usize>, unparsed: &mut usize) -> Option<f64> {
    let raw = row.field(index?).trim();
    if raw.is_empty() {
        return None;
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        Ok(value) if value.is_nan() => None,
        _ => {
            *unparsed += 1;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prepare(csv: &str) -> Result<PreparedTable> {
        DataPreparer::default().prepare_bytes(csv.as_bytes())
    }

    #[test]
    fn test_reference_row() -> Result<()> {
        let prepared = prepare(
            " Date,Lat,Lon,Predicted_PM25,Actual_PM25\n2023-08-31,38.5,-121.3,40.2,45.0\n",
        )?;
        let table = prepared.table;

        assert_eq!(table.headers()[0], "Date");
        assert_eq!(table.len(), 1);

        let record = &table.records()[0];
        assert_eq!(record.location_label, "38.5, -121.3");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 8, 31).unwrap());

        let metrics = record.metrics.unwrap();
        assert!((metrics.error - 4.8).abs() < 1e-9);
        assert!((metrics.absolute_error - 4.8).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_missing_date_column_is_fatal() {
        let result = prepare("Lat,Lon\n38.5,-121.3\n");
        assert!(
            matches!(result, Err(ProcessingError::MissingRequiredColumn(ref c)) if c == "date")
        );
    }

    #[test]
    fn test_missing_coordinate_column_is_fatal() {
        let result = prepare("Date,Lat\n2023-08-31,38.5\n");
        assert!(
            matches!(result, Err(ProcessingError::MissingRequiredColumn(ref c)) if c == "lon")
        );
    }

    #[test]
    fn test_malformed_date_is_fatal() {
        let result = prepare("Date,Lat,Lon\n2023-08-31,38.5,-121.3\nnot-a-date,39.0,-120.0\n");
        match result {
            Err(ProcessingError::InvalidDate { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_fails_even_on_row_with_bad_coordinates() {
        let result = prepare("Date,Lat,Lon\n,abc,-120.0\n");
        assert!(matches!(result, Err(ProcessingError::InvalidDate { .. })));
    }

    #[test]
    fn test_bad_coordinates_drop_only_their_row() -> Result<()> {
        let prepared = prepare(
            "Date,Lat,Lon,State_ID\n\
             2023-08-30,38.5,-121.3,6\n\
             2023-08-31,abc,-121.3,41\n\
             2023-09-01,45.1,,53\n\
             2023-09-02,95.0,-121.3,32\n\
             2023-09-03,36.1,-115.1,32\n",
        )?;

        let table = &prepared.table;
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].region, "California");
        assert_eq!(
            table.records()[0].date,
            NaiveDate::from_ymd_opt(2023, 8, 30).unwrap()
        );
        assert_eq!(table.records()[1].region, "Nevada");
        assert_eq!(
            table.records()[1].date,
            NaiveDate::from_ymd_opt(2023, 9, 3).unwrap()
        );

        let reasons: Vec<_> = prepared
            .report
            .dropped_rows
            .iter()
            .map(|d| (d.line, d.reason.clone()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (2, DropReason::InvalidLatitude),
                (3, DropReason::InvalidLongitude),
                (4, DropReason::OutOfRange),
            ]
        );
        assert_eq!(prepared.report.rows_read, 5);
        assert_eq!(prepared.report.rows_kept, 2);
        Ok(())
    }

    #[test]
    fn test_missing_state_column_uses_fallback() -> Result<()> {
        let prepared = prepare("Date,Lat,Lon\n2023-08-31,38.5,-121.3\n2023-08-31,45.5,-122.6\n")?;

        assert!(!prepared.table.capabilities().region);
        assert!(prepared
            .table
            .records()
            .iter()
            .all(|r| r.region == "Other" && r.state_id.is_none()));
        Ok(())
    }

    #[test]
    fn test_unmapped_state_uses_fallback() -> Result<()> {
        let options = PipelineOptions {
            fallback_region: "All Regions".to_string(),
            ..Default::default()
        };
        let prepared = DataPreparer::new(options).prepare_bytes(
            b"Date,Lat,Lon,State_ID\n2023-08-31,38.5,-121.3,16\n2023-08-31,45.5,-122.6,41.0\n",
        )?;

        let records = prepared.table.records();
        assert_eq!(records[0].state_id, Some(16));
        assert_eq!(records[0].region, "All Regions");
        assert_eq!(records[1].region, "Oregon");
        Ok(())
    }

    #[test]
    fn test_missing_pollutant_columns_degrade() -> Result<()> {
        let prepared = prepare("Date,Lat,Lon,Predicted_PM25\n2023-08-31,38.5,-121.3,40.2\n")?;

        let caps = prepared.table.capabilities();
        assert!(caps.predicted);
        assert!(!caps.actual);
        assert!(!caps.has_error_metrics());

        let record = &prepared.table.records()[0];
        assert_eq!(record.predicted_pm25, Some(40.2));
        assert!(record.metrics.is_none());
        Ok(())
    }

    #[test]
    fn test_blank_and_garbage_optional_values() -> Result<()> {
        let prepared = prepare(
            "Date,Lat,Lon,Predicted_PM25,Actual_PM25,Smoke_Yesterday\n\
             2023-08-31,38.5,-121.3,,45.0,n/a\n\
             2023-08-31,38.6,-121.3,NaN,45.0,2\n",
        )?;

        let records = prepared.table.records();
        assert!(records[0].metrics.is_none());
        assert_eq!(records[0].features.smoke_yesterday, None);
        assert_eq!(records[1].predicted_pm25, None);
        assert_eq!(records[1].features.smoke_yesterday, Some(2.0));
        assert_eq!(prepared.report.unparsed_values, 1);
        Ok(())
    }

    #[test]
    fn test_semicolon_delimited_source() -> Result<()> {
        let options = PipelineOptions {
            delimiter: ';',
            ..Default::default()
        };
        let prepared = DataPreparer::new(options)
            .prepare_bytes(b"Date;Lat;Lon;State_ID\n2023-08-31;38.5;-121.3;6\n")?;

        let record = &prepared.table.records()[0];
        assert_eq!(record.location_label, "38.5, -121.3");
        assert_eq!(record.region, "California");
        Ok(())
    }

    #[test]
    fn test_label_precision() -> Result<()> {
        let options = PipelineOptions {
            label_precision: Some(2),
            ..Default::default()
        };
        let prepared = DataPreparer::new(options)
            .prepare_bytes(b"Date,Lat,Lon\n2023-08-31,38.5012,-121.2999\n")?;

        let record = &prepared.table.records()[0];
        assert_eq!(record.location_label, "38.5, -121.3");
        assert_eq!(record.latitude, 38.5012);
        Ok(())
    }

    #[test]
    fn test_prepare_is_idempotent() -> Result<()> {
        let csv = "Date,Lat,Lon,State_ID,Predicted_PM25,Actual_PM25\n\
                   2023-08-31,38.5,-121.3,6,40.2,45.0\n\
                   2023-08-31,bad,-121.3,6,10.0,12.0\n\
                   2023-09-01,45.5,-122.6,41,8.0,7.5\n";

        let first = prepare(csv)?;
        let second = prepare(csv)?;

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.table).unwrap(),
            serde_json::to_string(&second.table).unwrap()
        );
        Ok(())
    }

    #[test]
    fn test_empty_csv_with_headers() -> Result<()> {
        let prepared = prepare("Date,Lat,Lon\n")?;
        assert!(prepared.table.is_empty());
        assert_eq!(prepared.report.rows_read, 0);
        Ok(())
    }
}
