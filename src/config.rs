//! Detection configuration.
//!
//! The confidence-normalization constants are empirically chosen; they live
//! here as named, overridable configuration rather than hard-coded
//! invariants, and can be loaded from a YAML file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Scale applied to the achievable pattern-weight ceiling.
pub const DEFAULT_DAMPING_FACTOR: f64 = 0.7;
/// Lower bound for the ceiling; keeps threshold tests meaningful on small or
/// unbalanced corpora and makes division by zero impossible.
pub const DEFAULT_NORMALIZATION_FLOOR: f64 = 2.0;
/// How many most-frequent names detection stats report.
pub const DEFAULT_TOP_NAME_COUNT: usize = 5;

/// Tunables for confidence scoring and detection stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_damping_factor")]
    pub damping_factor: f64,
    #[serde(default = "default_normalization_floor")]
    pub normalization_floor: f64,
    #[serde(default = "default_top_name_count")]
    pub top_name_count: usize,
}

fn default_damping_factor() -> f64 {
    DEFAULT_DAMPING_FACTOR
}

fn default_normalization_floor() -> f64 {
    DEFAULT_NORMALIZATION_FLOOR
}

fn default_top_name_count() -> usize {
    DEFAULT_TOP_NAME_COUNT
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            damping_factor: DEFAULT_DAMPING_FACTOR,
            normalization_floor: DEFAULT_NORMALIZATION_FLOOR,
            top_name_count: DEFAULT_TOP_NAME_COUNT,
        }
    }
}

impl ScoringConfig {
    /// Parse a config from a YAML file. Missing fields keep their defaults.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: ScoringConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
