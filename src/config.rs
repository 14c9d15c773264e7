use anyhow::{Context, Result};
use serde::Deserialize;

use crate::analyzers::curves::CurveOptions;
use crate::analyzers::types::{BucketThresholds, DayBasis, Metric};
use crate::ingest::IngestOptions;

/// Pipeline parameters, optionally read from a JSON file:
/// ```json
/// {
///   "thresholds": { "low_max": 50, "mid_max": 100, "high_max": 300 },
///   "excluded_locations": ["World", "International"],
///   "top_n": 30,
///   "secondary_metric": "deaths",
///   "day_basis": "qualifying_days"
/// }
/// ```
/// Every field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub thresholds: BucketThresholds,
    pub excluded_locations: Vec<String>,
    pub top_n: usize,
    pub secondary_metric: Metric,
    pub day_basis: DayBasis,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            thresholds: BucketThresholds::default(),
            excluded_locations: IngestOptions::default().excluded_locations,
            top_n: 30,
            secondary_metric: Metric::Deaths,
            day_basis: DayBasis::QualifyingDays,
        }
    }
}

impl PipelineConfig {
    /// Loads and validates the config at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        Self::from_json(&content).with_context(|| format!("invalid config {path}"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(content)?;
        config.thresholds.validate()?;
        Ok(config)
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            excluded_locations: self.excluded_locations.clone(),
        }
    }

    pub fn curve_options(&self, metric: Metric) -> CurveOptions {
        CurveOptions {
            metric,
            secondary: self.secondary_metric,
            thresholds: self.thresholds,
            top_n: self.top_n,
            day_basis: self.day_basis,
        }
    }
}
