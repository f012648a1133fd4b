use crate::error::Result;
use crate::utils::constants::{
    ACTUAL_COLUMNS, DATE_COLUMNS, LATITUDE_COLUMNS, LONGITUDE_COLUMNS, PM25_3DAY_AVG_COLUMNS,
    PM25_YESTERDAY_COLUMNS, PREDICTED_COLUMNS, SMOKE_YESTERDAY_COLUMNS, STATE_ID_COLUMNS,
    VELOCITY_YESTERDAY_COLUMNS,
};
use csv::ReaderBuilder;
use encoding_rs::{UTF_8, WINDOWS_1252};
use std::borrow::Cow;
use tracing::{debug, warn};

/// One data row as read from the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based data row number
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRow {
    /// Cell at `index`; short rows read as empty
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Untyped CSV contents with trimmed headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Column positions for every field the pipeline understands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    pub date: Option<usize>,
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
    pub state_id: Option<usize>,
    pub predicted: Option<usize>,
    pub actual: Option<usize>,
    pub smoke_yesterday: Option<usize>,
    pub velocity_yesterday: Option<usize>,
    pub pm25_3day_avg: Option<usize>,
    pub pm25_yesterday: Option<usize>,
}

impl ColumnIndex {
    pub fn resolve(headers: &[String]) -> Self {
        Self {
            date: find_column(headers, DATE_COLUMNS),
            latitude: find_column(headers, LATITUDE_COLUMNS),
            longitude: find_column(headers, LONGITUDE_COLUMNS),
            state_id: find_column(headers, STATE_ID_COLUMNS),
            predicted: find_column(headers, PREDICTED_COLUMNS),
            actual: find_column(headers, ACTUAL_COLUMNS),
            smoke_yesterday: find_column(headers, SMOKE_YESTERDAY_COLUMNS),
            velocity_yesterday: find_column(headers, VELOCITY_YESTERDAY_COLUMNS),
            pm25_3day_avg: find_column(headers, PM25_3DAY_AVG_COLUMNS),
            pm25_yesterday: find_column(headers, PM25_YESTERDAY_COLUMNS),
        }
    }
}

/// First header matching any alias, ignoring case
pub fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| aliases.iter().any(|alias| header.eq_ignore_ascii_case(alias)))
}

/// Strip surrounding whitespace from every column name
pub fn normalize_headers<I, S>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    headers
        .into_iter()
        .map(|header| header.as_ref().trim().to_string())
        .collect()
}

/// Decode UTF-8 (BOM removed), falling back to Windows-1252
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return text;
    }

    warn!("Source is not valid UTF-8, decoding as Windows-1252");
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text
}

pub struct CsvTableReader {
    delimiter: u8,
}

impl CsvTableReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Parse CSV bytes into trimmed headers and raw rows
    pub fn read(&self, bytes: &[u8]) -> Result<RawTable> {
        let text = decode_text(bytes);
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let raw_headers = reader.headers()?.clone();
        let headers = normalize_headers(raw_headers.iter());

        let renamed = raw_headers
            .iter()
            .zip(&headers)
            .filter(|(raw, trimmed)| *raw != trimmed.as_str())
            .count();
        if renamed > 0 {
            debug!(renamed, "Trimmed whitespace from column names");
        }

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            rows.push(RawRow {
                line: index + 1,
                fields: record.iter().map(str::to_string).collect(),
            });
        }

        Ok(RawTable { headers, rows })
    }
}

impl Default for CsvTableReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_headers() {
        let headers = normalize_headers([" Date", "Lat ", "\tLon", "Predicted_PM25"]);
        assert_eq!(headers, vec!["Date", "Lat", "Lon", "Predicted_PM25"]);
    }

    #[test]
    fn test_find_column_is_case_insensitive() {
        let headers = normalize_headers(["DATE", "Latitude", "lon", "State_ID"]);
        let index = ColumnIndex::resolve(&headers);

        assert_eq!(index.date, Some(0));
        assert_eq!(index.latitude, Some(1));
        assert_eq!(index.longitude, Some(2));
        assert_eq!(index.state_id, Some(3));
        assert_eq!(index.predicted, None);
        assert_eq!(index.smoke_yesterday, None);
    }

    #[test]
    fn test_read_trims_headers_and_keeps_order() -> Result<()> {
        let csv = b" Date , Lat,Lon\n2023-08-31,38.5,-121.3\n2023-09-01,39.0,-120.0\n";
        let table = CsvTableReader::new().read(csv)?;

        assert_eq!(table.headers, vec!["Date", "Lat", "Lon"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].line, 1);
        assert_eq!(table.rows[1].field(1), "39.0");
        Ok(())
    }

    #[test]
    fn test_short_rows_read_as_empty() -> Result<()> {
        let csv = b"Date,Lat,Lon,Predicted_PM25\n2023-08-31,38.5,-121.3\n";
        let table = CsvTableReader::new().read(csv)?;

        assert_eq!(table.rows[0].field(3), "");
        Ok(())
    }

    #[test]
    fn test_bom_is_removed() -> Result<()> {
        let csv = b"\xEF\xBB\xBFDate,Lat,Lon\n2023-08-31,38.5,-121.3\n";
        let table = CsvTableReader::new().read(csv)?;

        assert_eq!(table.headers[0], "Date");
        Ok(())
    }

    #[test]
    fn test_windows_1252_fallback() {
        // 0xB5 is the micro sign in Windows-1252 and invalid as UTF-8
        let text = decode_text(b"PM2.5 \xB5g");
        assert_eq!(text, "PM2.5 \u{b5}g");
    }

    #[test]
    fn test_custom_delimiter() -> Result<()> {
        let csv = b"Date;Lat;Lon\n2023-08-31;38.5;-121.3\n";
        let table = CsvTableReader::with_delimiter(b';').read(csv)?;

        assert_eq!(table.headers, vec!["Date", "Lat", "Lon"]);
        assert_eq!(table.rows[0].field(2), "-121.3");
        Ok(())
    }
}
