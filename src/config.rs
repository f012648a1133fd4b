//! Runtime settings: built-in defaults, then an optional TOML file, then
//! `SMOKESIGNAL_*` environment variables.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_DELIMITER, DEFAULT_FALLBACK_REGION, DEFAULT_HAZARDOUS_THRESHOLD,
    DEFAULT_MODERATE_THRESHOLD, DEFAULT_SOURCE_FILE, DEFAULT_WATCH_INTERVAL_SECS,
    HIDDEN_ARCHIVE_PREFIX,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardThresholds {
    /// Lowest predicted PM2.5 classified as moderate
    pub moderate: f64,
    /// Predicted PM2.5 above this is hazardous
    pub hazardous: f64,
}

impl Default for HazardThresholds {
    fn default() -> Self {
        Self {
            moderate: DEFAULT_MODERATE_THRESHOLD,
            hazardous: DEFAULT_HAZARDOUS_THRESHOLD,
        }
    }
}

impl HazardThresholds {
    pub fn validate(&self) -> Result<()> {
        if !self.moderate.is_finite() || !self.hazardous.is_finite() {
            return Err(ProcessingError::Config(
                "Hazard thresholds must be finite".to_string(),
            ));
        }

        if self.moderate > self.hazardous {
            return Err(ProcessingError::Config(format!(
                "Moderate threshold {} exceeds hazardous threshold {}",
                self.moderate, self.hazardous
            )));
        }

        Ok(())
    }
}

/// Options that shape how a source file is prepared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub hidden_prefix: String,
    pub fallback_region: String,
    /// Decimal places for location labels; `None` keeps full precision
    pub label_precision: Option<u32>,
    /// Field separator of the CSV payload; must be a single ASCII character
    pub delimiter: char,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            hidden_prefix: HIDDEN_ARCHIVE_PREFIX.to_string(),
            fallback_region: DEFAULT_FALLBACK_REGION.to_string(),
            label_precision: None,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub source: PathBuf,
    pub use_mmap: bool,
    pub watch_interval_secs: u64,
    pub pipeline: PipelineOptions,
    pub hazard: HazardThresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE_FILE),
            use_mmap: false,
            watch_interval_secs: DEFAULT_WATCH_INTERVAL_SECS,
            pipeline: PipelineOptions::default(),
            hazard: HazardThresholds::default(),
        }
    }
}

impl Settings {
    /// Load settings; an explicit file must exist, the default one is optional
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::load_layered(config_file, Self::environment())
    }

    /// `SMOKESIGNAL_SOURCE`, `SMOKESIGNAL_HAZARD__MODERATE`, ...
    fn environment() -> Environment {
        Environment::with_prefix("SMOKESIGNAL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_layered(config_file: Option<&Path>, environment: Environment) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("source", defaults.source.to_string_lossy().to_string())?
            .set_default("use_mmap", defaults.use_mmap)?
            .set_default("watch_interval_secs", defaults.watch_interval_secs)?
            .set_default("pipeline.hidden_prefix", defaults.pipeline.hidden_prefix)?
            .set_default("pipeline.fallback_region", defaults.pipeline.fallback_region)?
            .set_default("pipeline.delimiter", defaults.pipeline.delimiter.to_string())?
            .set_default("hazard.moderate", defaults.hazard.moderate)?
            .set_default("hazard.hazardous", defaults.hazard.hazardous)?;

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path).format(FileFormat::Toml)),
            None => builder.add_source(
                File::with_name(DEFAULT_CONFIG_FILE)
                    .format(FileFormat::Toml)
                    .required(false),
            ),
        };

        let settings: Settings = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.hazard.validate()?;

        if self.watch_interval_secs == 0 {
            return Err(ProcessingError::Config(
                "watch_interval_secs must be at least 1".to_string(),
            ));
        }

        let delimiter = self.pipeline.delimiter;
        if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
            return Err(ProcessingError::Config(format!(
                "delimiter {:?} must be a single ASCII character other than a quote or newline",
                delimiter
            )));
        }

        if let Some(precision) = self.pipeline.label_precision {
            if precision > 12 {
                return Err(ProcessingError::Config(format!(
                    "label_precision {} is too large (max 12)",
                    precision
                )));
            }
        }

        Ok(())
    }
}
