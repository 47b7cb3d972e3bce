//! Run configuration for the siting pipeline.
//!
//! Every option has a default matching the reference deployment (200 m cells,
//! 300 m exclusion around existing facilities, ten candidates spaced at
//! least 400 m apart). Configurations load from JSON, or TOML with the `toml`
//! feature.
//!
//! ```rust
//! use sitescore::Config;
//!
//! let config = Config::from_json(r#"{ "grid_size": 150.0, "top_n": 5 }"#)?;
//! assert_eq!(config.grid_size, 150.0);
//! assert_eq!(config.min_distance, 300.0);
//! # Ok::<(), sitescore::SiteError>(())
//! ```

use crate::error::{Result, SiteError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tolerance used when checking that score weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Relative weights of the two normalised demand metrics in a cell's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreWeights {
    pub traffic: f64,
    pub density: f64,
}

impl ScoreWeights {
    pub const fn new(traffic: f64, density: f64) -> Self {
        Self { traffic, density }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("traffic", self.traffic), ("density", self.density)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SiteError::InvalidConfig(format!(
                    "score weight '{}' must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        let sum = self.traffic + self.density;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SiteError::InvalidConfig(format!(
                "score weights must sum to 1.0, got {}",
                sum
            )));
        }

        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::new(0.7, 0.3)
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Side length of a grid cell in meters
    #[serde(default = "Config::default_grid_size")]
    pub grid_size: f64,

    /// Cells whose centroid lies within this distance of an existing facility are dropped
    #[serde(default = "Config::default_min_distance")]
    pub min_distance: f64,

    /// Maximum number of candidates to return
    #[serde(default = "Config::default_top_n")]
    pub top_n: usize,

    /// Minimum spacing between two selected candidates in meters
    #[serde(default = "Config::default_mutual_exclusion_radius")]
    pub mutual_exclusion_radius: f64,

    /// Cells with aggregate traffic at or below this value are discarded
    #[serde(default = "Config::default_traffic_floor")]
    pub traffic_floor: f64,

    /// Upper bound on the number of cells a tessellation may produce
    #[serde(default = "Config::default_max_cells")]
    pub max_cells: usize,

    #[serde(default)]
    pub score_weights: ScoreWeights,
}

impl Config {
    const fn default_grid_size() -> f64 {
        200.0
    }

    const fn default_min_distance() -> f64 {
        300.0
    }

    const fn default_top_n() -> usize {
        10
    }

    const fn default_mutual_exclusion_radius() -> f64 {
        400.0
    }

    const fn default_traffic_floor() -> f64 {
        50.0
    }

    const fn default_max_cells() -> usize {
        4_000_000
    }

    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_min_distance(mut self, min_distance: f64) -> Self {
        self.min_distance = min_distance;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_mutual_exclusion_radius(mut self, radius: f64) -> Self {
        self.mutual_exclusion_radius = radius;
        self
    }

    pub fn with_traffic_floor(mut self, floor: f64) -> Self {
        self.traffic_floor = floor;
        self
    }

    pub fn with_score_weights(mut self, weights: ScoreWeights) -> Self {
        self.score_weights = weights;
        self
    }

    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    /// Check every option. A non-positive cell size is reported as
    /// `InvalidGridConfiguration`, everything else as `InvalidConfig`.
    pub fn validate(&self) -> Result<()> {
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(SiteError::InvalidGridConfiguration(format!(
                "grid_size must be a positive number of meters, got {}",
                self.grid_size
            )));
        }

        if self.max_cells == 0 {
            return Err(SiteError::InvalidGridConfiguration(
                "max_cells must be greater than zero".to_string(),
            ));
        }

        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(SiteError::InvalidConfig(format!(
                "min_distance must be finite and non-negative, got {}",
                self.min_distance
            )));
        }

        if self.top_n == 0 {
            return Err(SiteError::InvalidConfig(
                "top_n must be at least 1".to_string(),
            ));
        }

        if !self.mutual_exclusion_radius.is_finite() || self.mutual_exclusion_radius < 0.0 {
            return Err(SiteError::InvalidConfig(format!(
                "mutual_exclusion_radius must be finite and non-negative, got {}",
                self.mutual_exclusion_radius
            )));
        }

        if !self.traffic_floor.is_finite() {
            return Err(SiteError::InvalidConfig(format!(
                "traffic_floor must be finite, got {}",
                self.traffic_floor
            )));
        }

        self.score_weights.validate()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(toml_str).map_err(|e| SiteError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SiteError::Serialization(e.to_string()))
    }

    /// Load a configuration file, choosing the format from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents),
            #[cfg(feature = "toml")]
            Some("toml") => Self::from_toml(&contents),
            other => Err(SiteError::InvalidConfig(format!(
                "unsupported configuration format: {:?}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid_size: Self::default_grid_size(),
            min_distance: Self::default_min_distance(),
            top_n: Self::default_top_n(),
            mutual_exclusion_radius: Self::default_mutual_exclusion_radius(),
            traffic_floor: Self::default_traffic_floor(),
            max_cells: Self::default_max_cells(),
            score_weights: ScoreWeights::default(),
        }
    }
}
