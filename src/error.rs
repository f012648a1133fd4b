use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("No CSV data file found in archive")]
    NoDataFileFound,

    #[error("Missing required column: {0}")]
    MissingRequiredColumn(String),

    #[error("Invalid date '{value}' on data row {line}")]
    InvalidDate { line: usize, value: String },

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProcessingError {
    /// Structural failures abort the session; everything else is recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ProcessingError::InvalidCoordinate(_) | ProcessingError::Validation(_)
        )
    }
}
