//! Min-max normalisation of cell metrics and the weighted site score.

use crate::compute::aggregate::CellAggregate;
use crate::compute::grid::CellId;
use crate::config::ScoreWeights;
use crate::error::{Result, SiteError};
use geo::Point;

/// A cell with normalised metrics and its combined score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCell {
    pub aggregate: CellAggregate,
    pub traffic_norm: f64,
    pub density_norm: f64,
    pub score: f64,
    /// Distance to the closest existing facility, once measured
    pub nearest_facility_distance: Option<f64>,
}

impl ScoredCell {
    pub fn id(&self) -> CellId {
        self.aggregate.id()
    }

    pub fn centroid(&self) -> Point {
        self.aggregate.centroid()
    }

    pub fn total_traffic(&self) -> f64 {
        self.aggregate.total_traffic
    }

    pub fn traffic_density(&self) -> f64 {
        self.aggregate.traffic_density
    }
}

/// Rescale `values` linearly onto [0, 1].
///
/// The minimum maps to exactly 0 and the maximum to exactly 1. When every
/// value is equal (including the single-value case) there is no range to
/// scale, and every output is 0.
///
/// ```rust
/// use sitescore::compute::scoring::min_max_normalize;
///
/// assert_eq!(min_max_normalize(&[10.0, 20.0, 15.0]), vec![0.0, 1.0, 0.5]);
/// assert_eq!(min_max_normalize(&[7.0, 7.0]), vec![0.0, 0.0]);
/// ```
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range > 0.0 {
        values.iter().map(|v| (v - min) / range).collect()
    } else {
        vec![0.0; values.len()]
    }
}

/// Normalise traffic and density across `cells` and combine them into a score.
///
/// # Errors
///
/// `EmptyCandidateSet` when `cells` is empty.
pub fn score_cells(cells: Vec<CellAggregate>, weights: &ScoreWeights) -> Result<Vec<ScoredCell>> {
    if cells.is_empty() {
        return Err(SiteError::EmptyCandidateSet(
            "no cells left to score after the traffic floor".to_string(),
        ));
    }

    let traffic: Vec<f64> = cells.iter().map(|c| c.total_traffic).collect();
    let density: Vec<f64> = cells.iter().map(|c| c.traffic_density).collect();
    let traffic_norm = min_max_normalize(&traffic);
    let density_norm = min_max_normalize(&density);

    Ok(cells
        .into_iter()
        .zip(traffic_norm.into_iter().zip(density_norm))
        .map(|(aggregate, (traffic_norm, density_norm))| ScoredCell {
            aggregate,
            traffic_norm,
            density_norm,
            score: weights.traffic * traffic_norm + weights.density * density_norm,
            nearest_facility_distance: None,
        })
        .collect())
}
