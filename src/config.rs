use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::clean::CleaningRules;

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Settings read from an optional JSON file. Every field has a default so a
/// partial file is fine.
///
/// ```json
/// { "data_path": "listings.csv", "histogram_bins": 50,
///   "cleaning": { "undefined_median_fallback": -1 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// File opened at startup.
    pub data_path: PathBuf,
    pub cleaning: CleaningRules,
    pub histogram_bins: usize,
    /// Granularity and lower bound of the row-count slider.
    pub row_limit_step: usize,
    pub default_row_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./vehicles_us_cleaned.csv"),
            cleaning: CleaningRules::default(),
            histogram_bins: 30,
            row_limit_step: 10,
            default_row_limit: 100,
        }
    }
}

impl DashboardConfig {
    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }
}
