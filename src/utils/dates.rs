use crate::utils::constants::{DATETIME_FORMATS, DATE_FORMATS};
use chrono::{NaiveDate, NaiveDateTime};

/// Parse a calendar date, accepting datetimes by keeping their date part
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
    {
        return Some(date);
    }

    let without_zone = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(without_zone, format).ok())
        .map(|datetime| datetime.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2023-08-31"), Some(ymd(2023, 8, 31)));
        assert_eq!(parse_date(" 2023/08/31 "), Some(ymd(2023, 8, 31)));
        assert_eq!(parse_date("08/31/2023"), Some(ymd(2023, 8, 31)));
        assert_eq!(parse_date("20230831"), Some(ymd(2023, 8, 31)));
    }

    #[test]
    fn test_parse_datetime_keeps_date() {
        assert_eq!(parse_date("2023-08-31 00:00:00"), Some(ymd(2023, 8, 31)));
        assert_eq!(parse_date("2023-08-31T14:30:00"), Some(ymd(2023, 8, 31)));
        assert_eq!(parse_date("2023-08-31T14:30:00.250Z"), Some(ymd(2023, 8, 31)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2023-02-30"), None);
        assert_eq!(parse_date("2023-13-01"), None);
    }
}
