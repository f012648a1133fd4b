use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::models::{CleanedTable, ObservationRecord, RegionFilter};

/// The three independent dashboard selectors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub date: NaiveDate,
    pub region: RegionFilter,
    pub location: Option<String>,
}

impl Selection {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            region: RegionFilter::All,
            location: None,
        }
    }

    pub fn with_region(mut self, region: RegionFilter) -> Self {
        self.region = region;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Everything the presentation layer needs for one selection
#[derive(Debug, Clone, Serialize)]
pub struct SelectionView<'a> {
    pub selection: Selection,
    pub day_slice: Vec<&'a ObservationRecord>,
    pub region_slice: Vec<&'a ObservationRecord>,
    pub point: Option<&'a ObservationRecord>,
    pub region_options: Vec<String>,
    pub location_options: Vec<String>,
}

impl SelectionView<'_> {
    /// No rows for this date and region; a valid result, not an error
    pub fn is_empty(&self) -> bool {
        self.region_slice.is_empty()
    }
}

pub struct ViewSelector<'a> {
    table: &'a CleanedTable,
}

impl<'a> ViewSelector<'a> {
    pub fn new(table: &'a CleanedTable) -> Self {
        Self { table }
    }

    /// Rows observed on exactly this date, in table order
    pub fn day_slice(&self, date: NaiveDate) -> Vec<&'a ObservationRecord> {
        self.table
            .records()
            .iter()
            .filter(|record| record.date == date)
            .collect()
    }

    pub fn region_slice(
        &self,
        day: &[&'a ObservationRecord],
        region: &RegionFilter,
    ) -> Vec<&'a ObservationRecord> {
        day.iter()
            .copied()
            .filter(|record| region.matches(&record.region))
            .collect()
    }

    /// First row in table order with the selected location label
    pub fn point(
        &self,
        region_slice: &[&'a ObservationRecord],
        location: &str,
    ) -> Option<&'a ObservationRecord> {
        region_slice
            .iter()
            .copied()
            .find(|record| record.location_label == location)
    }

    /// Sorted distinct region labels present on the day
    pub fn region_options(&self, day: &[&'a ObservationRecord]) -> Vec<String> {
        day.iter()
            .map(|record| record.region.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Distinct location labels in first-appearance order
    pub fn location_options(&self, region_slice: &[&'a ObservationRecord]) -> Vec<String> {
        let mut seen = HashSet::new();
        region_slice
            .iter()
            .filter(|record| seen.insert(record.location_label.as_str()))
            .map(|record| record.location_label.clone())
            .collect()
    }

    pub fn select(&self, selection: &Selection) -> SelectionView<'a> {
        let day_slice = self.day_slice(selection.date);
        let region_slice = self.region_slice(&day_slice, &selection.region);
        let point = selection
            .location
            .as_deref()
            .and_then(|location| self.point(&region_slice, location));
        let region_options = self.region_options(&day_slice);
        let location_options = self.location_options(&region_slice);

        SelectionView {
            selection: selection.clone(),
            day_slice,
            region_slice,
            point,
            region_options,
            location_options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Capabilities;
    use pretty_assertions::assert_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 8, day).unwrap()
    }

    fn record(line: usize, day: u32, lat: f64, region: &str, predicted: f64) -> ObservationRecord {
        ObservationRecord::new(
            line,
            date(day),
            lat,
            -121.3,
            format!("{}, -121.3", lat),
            region.to_string(),
        )
        .with_pollutants(Some(predicted), Some(predicted + 1.0))
    }

    fn table() -> CleanedTable {
        CleanedTable::new(
            vec!["Date".to_string(), "Lat".to_string(), "Lon".to_string()],
            vec![
                record(1, 30, 38.5, "California", 10.0),
                record(2, 31, 38.5, "California", 40.2),
                record(3, 31, 45.5, "Oregon", 20.0),
                record(4, 31, 38.5, "California", 99.0),
                record(5, 31, 39.5, "California", 5.0),
            ],
            Capabilities::default(),
        )
    }

    #[test]
    fn test_day_slice_uses_exact_date() {
        let table = table();
        let selector = ViewSelector::new(&table);

        let lines: Vec<_> = selector.day_slice(date(31)).iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 5]);
        assert!(selector.day_slice(date(1)).is_empty());
    }

    #[test]
    fn test_region_slice() {
        let table = table();
        let selector = ViewSelector::new(&table);
        let day = selector.day_slice(date(31));

        let all = selector.region_slice(&day, &RegionFilter::All);
        assert_eq!(all.len(), 4);

        let oregon = selector.region_slice(&day, &RegionFilter::Only("Oregon".to_string()));
        assert_eq!(oregon.len(), 1);
        assert_eq!(oregon[0].line, 3);
    }

    #[test]
    fn test_point_takes_first_match_in_table_order() {
        let table = table();
        let selection = Selection::for_date(date(31))
            .with_region(RegionFilter::Only("California".to_string()))
            .with_location("38.5, -121.3");

        let view = ViewSelector::new(&table).select(&selection);
        assert_eq!(view.point.map(|r| r.line), Some(2));
    }

    #[test]
    fn test_point_outside_region_is_none() {
        let table = table();
        let selection = Selection::for_date(date(31))
            .with_region(RegionFilter::Only("Oregon".to_string()))
            .with_location("38.5, -121.3");

        let view = ViewSelector::new(&table).select(&selection);
        assert!(view.point.is_none());
        assert!(!view.is_empty());
    }

    #[test]
    fn test_option_sets() {
        let table = table();
        let view = ViewSelector::new(&table).select(&Selection::for_date(date(31)));

        assert_eq!(view.region_options, vec!["California", "Oregon"]);
        assert_eq!(
            view.location_options,
            vec!["38.5, -121.3", "45.5, -121.3", "39.5, -121.3"]
        );
    }

    #[test]
    fn test_empty_day_gives_empty_options() {
        let table = table();
        let selection = Selection::for_date(date(1)).with_location("38.5, -121.3");
        let view = ViewSelector::new(&table).select(&selection);

        assert!(view.is_empty());
        assert!(view.day_slice.is_empty());
        assert!(view.region_options.is_empty());
        assert!(view.location_options.is_empty());
        assert!(view.point.is_none());
    }
}
