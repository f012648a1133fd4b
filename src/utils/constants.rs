/// File names
pub const DEFAULT_SOURCE_FILE: &str = "final_predictions.csv.zip";
pub const DEFAULT_CONFIG_FILE: &str = "smoke-signal.toml";
pub const CSV_EXTENSION: &str = ".csv";

/// Archive entries under this prefix are platform metadata, never data
pub const HIDDEN_ARCHIVE_PREFIX: &str = "__MACOSX/";

/// Zip local file header and empty-archive signatures
pub const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
pub const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";

/// Column aliases, compared case-insensitively against trimmed headers
pub const DATE_COLUMNS: &[&str] = &["date"];
pub const LATITUDE_COLUMNS: &[&str] = &["lat", "latitude"];
pub const LONGITUDE_COLUMNS: &[&str] = &["lon", "lng", "long", "longitude"];
pub const STATE_ID_COLUMNS: &[&str] = &["state_id", "stateid", "state"];
pub const PREDICTED_COLUMNS: &[&str] = &["predicted_pm25"];
pub const ACTUAL_COLUMNS: &[&str] = &["actual_pm25"];
pub const SMOKE_YESTERDAY_COLUMNS: &[&str] = &["smoke_yesterday"];
pub const VELOCITY_YESTERDAY_COLUMNS: &[&str] = &["velocity_yesterday"];
pub const PM25_3DAY_AVG_COLUMNS: &[&str] = &["pm25_3day_avg"];
pub const PM25_YESTERDAY_COLUMNS: &[&str] = &["pm25_yesterday"];

/// Accepted date and datetime layouts, tried in order
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];
pub const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// State ID lookup (US FIPS codes)
pub const STATE_NAMES: &[(u32, &str)] = &[
    (6, "California"),
    (41, "Oregon"),
    (53, "Washington"),
    (32, "Nevada"),
    (4, "Arizona"),
];

pub const DEFAULT_FALLBACK_REGION: &str = "Other";
pub const DEFAULT_DELIMITER: char = ',';

/// Hazard thresholds in µg/m³ of PM2.5
pub const DEFAULT_MODERATE_THRESHOLD: f64 = 12.0;
pub const DEFAULT_HAZARDOUS_THRESHOLD: f64 = 35.0;

/// Narrative triggers
pub const SMOKE_PLUME_THRESHOLD: f64 = 0.0;
pub const RAPID_RISE_VELOCITY: f64 = 10.0;

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const DEFAULT_WATCH_INTERVAL_SECS: u64 = 5;

/// Look up the state name for a numeric state ID
pub fn state_name(state_id: u32) -> Option<&'static str> {
    STATE_NAMES
        .iter()
        .find(|(id, _)| *id == state_id)
        .map(|(_, name)| *name)
}
