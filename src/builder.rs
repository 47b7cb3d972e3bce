//! Pipeline builder for flexible configuration
//!
//! Starts from defaults (or a configuration file) and applies individual
//! overrides on top before validating.

use crate::config::{Config, ScoreWeights};
use crate::error::Result;
use crate::pipeline::SitingPipeline;
use std::path::PathBuf;

/// Builder for a [`SitingPipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Config,
    config_path: Option<PathBuf>,
    grid_size: Option<f64>,
    min_distance: Option<f64>,
    top_n: Option<usize>,
    mutual_exclusion_radius: Option<f64>,
    traffic_floor: Option<f64>,
    score_weights: Option<ScoreWeights>,
}

impl PipelineBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the base configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Load the base configuration from a JSON (or TOML) file at build time.
    pub fn config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn grid_size(mut self, meters: f64) -> Self {
        self.grid_size = Some(meters);
        self
    }

    pub fn min_distance(mut self, meters: f64) -> Self {
        self.min_distance = Some(meters);
        self
    }

    pub fn top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    pub fn mutual_exclusion_radius(mut self, meters: f64) -> Self {
        self.mutual_exclusion_radius = Some(meters);
        self
    }

    pub fn traffic_floor(mut self, floor: f64) -> Self {
        self.traffic_floor = Some(floor);
        self
    }

    pub fn score_weights(mut self, traffic: f64, density: f64) -> Self {
        self.score_weights = Some(ScoreWeights::new(traffic, density));
        self
    }

    /// Resolve the configuration and validate it.
    pub fn build(self) -> Result<SitingPipeline> {
        let mut config = match &self.config_path {
            Some(path) => Config::from_path(path)?,
            None => self.config,
        };

        if let Some(grid_size) = self.grid_size {
            config.grid_size = grid_size;
        }
        if let Some(min_distance) = self.min_distance {
            config.min_distance = min_distance;
        }
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(radius) = self.mutual_exclusion_radius {
            config.mutual_exclusion_radius = radius;
        }
        if let Some(floor) = self.traffic_floor {
            config.traffic_floor = floor;
        }
        if let Some(weights) = self.score_weights {
            config.score_weights = weights;
        }

        SitingPipeline::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SiteError;
    use std::io::Write;

    #[test]
    fn test_builder_default() {
        let pipeline = PipelineBuilder::new().build().unwrap();
        assert_eq!(pipeline.config(), &Config::default());
    }

    #[test]
    fn test_builder_overrides() {
        let pipeline = PipelineBuilder::new()
            .grid_size(100.0)
            .top_n(3)
            .score_weights(0.5, 0.5)
            .build()
            .unwrap();

        assert_eq!(pipeline.config().grid_size, 100.0);
        assert_eq!(pipeline.config().top_n, 3);
        assert_eq!(pipeline.config().score_weights, ScoreWeights::new(0.5, 0.5));
        assert_eq!(pipeline.config().min_distance, 300.0);
    }

    #[test]
    fn test_builder_validates() {
        let err = PipelineBuilder::new().grid_size(-1.0).build().unwrap_err();
        assert!(matches!(err, SiteError::InvalidGridConfiguration(_)));
    }

    #[test]
    fn test_builder_config_path_with_override() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "grid_size": 250.0, "top_n": 4 }}"#).unwrap();

        let pipeline = PipelineBuilder::new()
            .config_path(file.path())
            .top_n(6)
            .build()
            .unwrap();

        assert_eq!(pipeline.config().grid_size, 250.0);
        assert_eq!(pipeline.config().top_n, 6);
    }

    #[test]
    fn test_builder_missing_config_file() {
        let err = PipelineBuilder::new()
            .config_path("/nonexistent/sitescore.json")
            .build()
            .unwrap_err();
        assert!(matches!(err, SiteError::Io(_)));
    }
}
