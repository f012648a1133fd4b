use crate::error::{ProcessingError, Result};

/// Coerce a raw coordinate cell to a finite decimal degree value
///
/// # Examples
/// ```
/// use smoke_signal::utils::parse_coordinate;
///
/// let lat = parse_coordinate(" 38.5 ").unwrap();
/// assert!((lat - 38.5).abs() < 1e-12);
/// assert!(parse_coordinate("n/a").is_err());
/// ```
pub fn parse_coordinate(coord_str: &str) -> Result<f64> {
    let trimmed = coord_str.trim();

    if trimmed.is_empty() {
        return Err(ProcessingError::InvalidCoordinate(
            "Empty coordinate value".to_string(),
        ));
    }

    let value = trimmed.parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid coordinate value: '{}'", coord_str))
    })?;

    if !value.is_finite() {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Coordinate is not a finite number: '{}'",
            coord_str
        )));
    }

    Ok(value)
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Render a coordinate the way the dashboard labels it: shortest round-trip
/// form, always with a fractional part ("38.0", not "38")
pub fn format_coordinate(value: f64) -> String {
    let rendered = format!("{}", value);
    if rendered.contains(['.', 'e', 'E']) || !value.is_finite() {
        rendered
    } else {
        format!("{}.0", rendered)
    }
}

/// Build the display and grouping key for a sensor location
pub fn location_label(latitude: f64, longitude: f64, precision: Option<u32>) -> String {
    let (lat, lon) = match precision {
        Some(p) => (round_to(latitude, p), round_to(longitude, p)),
        None => (latitude, longitude),
    };

    format!("{}, {}", format_coordinate(lat), format_coordinate(lon))
}
