use serde::{Deserialize, Serialize};

use crate::utils::constants::state_name;

/// Region selector: everything, or one region label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionFilter {
    #[default]
    All,
    Only(String),
}

impl RegionFilter {
    /// Parse a selector value; "all", "all regions" and empty mean no filter
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "all" | "all regions" => RegionFilter::All,
            _ => RegionFilter::Only(trimmed.to_string()),
        }
    }

    pub fn matches(&self, region: &str) -> bool {
        match self {
            RegionFilter::All => true,
            RegionFilter::Only(label) => label == region,
        }
    }
}

/// Parse a state ID cell; integral floats such as "6.0" are accepted
pub fn parse_state_id(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(id) = trimmed.parse::<u32>() {
        return Some(id);
    }

    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

/// Resolve a region label, falling back for unknown or absent IDs
pub fn region_label(state_id: Option<u32>, fallback: &str) -> String {
    state_id
        .and_then(state_name)
        .unwrap_or(fallback)
        .to_string()
}
