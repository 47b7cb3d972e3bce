//! Display-oriented views of a [`SitingReport`].
//!
//! These shape results for a map frontend: a heatmap limited to the busiest
//! cells, the recommended sites, and the existing facilities, with values
//! rounded for transport. Coordinates stay in the planar input system;
//! reprojection to longitude/latitude is left to the caller.

#[cfg(feature = "geojson")]
pub mod geojson;

use crate::compute::scoring::ScoredCell;
use crate::error::{Result, SiteError};
use crate::pipeline::SitingReport;
use serde::Serialize;
use sitescore_types::ExistingFacility;

/// Quantile of cell traffic at which heatmap cells start.
pub const DEFAULT_HEATMAP_QUANTILE: f64 = 0.75;

/// Label used for facilities that carry none.
pub const DEFAULT_FACILITY_LABEL: &str = "facility";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatPoint {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedSite {
    pub rank: usize,
    pub x: f64,
    pub y: f64,
    pub score: f64,
    pub total_traffic: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityMarker {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// Everything a map view needs, ready to serialise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitingSummary {
    pub heatmap: Vec<HeatPoint>,
    pub recommended: Vec<RecommendedSite>,
    pub facilities: Vec<FacilityMarker>,
    pub notes: Vec<String>,
}

impl SitingSummary {
    /// Build a summary using the default heatmap quantile.
    pub fn from_report(report: &SitingReport, facilities: &[ExistingFacility]) -> Result<Self> {
        Self::with_quantile(report, facilities, DEFAULT_HEATMAP_QUANTILE)
    }

    pub fn with_quantile(
        report: &SitingReport,
        facilities: &[ExistingFacility],
        quantile: f64,
    ) -> Result<Self> {
        let recommended = report
            .candidates
            .iter()
            .enumerate()
            .map(|(idx, candidate)| RecommendedSite {
                rank: idx + 1,
                x: round_to(candidate.centroid.x(), 6),
                y: round_to(candidate.centroid.y(), 6),
                score: round_to(candidate.score, 3),
                total_traffic: round_to(candidate.total_traffic, 2),
            })
            .collect();

        let facilities = facilities
            .iter()
            .map(|facility| FacilityMarker {
                x: round_to(facility.x(), 6),
                y: round_to(facility.y(), 6),
                label: facility.label_or(DEFAULT_FACILITY_LABEL).to_string(),
            })
            .collect();

        Ok(Self {
            heatmap: heatmap_points(&report.grid, quantile)?,
            recommended,
            facilities,
            notes: report.diagnostics.iter().map(|d| d.to_string()).collect(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Centroids of the cells whose traffic reaches the `quantile` of the grid,
/// weighted by traffic.
///
/// # Errors
///
/// `InvalidInput` when `quantile` is outside [0, 1].
pub fn heatmap_points(grid: &[ScoredCell], quantile: f64) -> Result<Vec<HeatPoint>> {
    let traffic: Vec<f64> = grid.iter().map(|cell| cell.total_traffic()).collect();
    let Some(threshold) = quantile_of(&traffic, quantile)? else {
        return Ok(Vec::new());
    };

    Ok(grid
        .iter()
        .filter(|cell| cell.total_traffic() >= threshold)
        .map(|cell| {
            let centroid = cell.centroid();
            HeatPoint {
                x: round_to(centroid.x(), 6),
                y: round_to(centroid.y(), 6),
                weight: round_to(cell.total_traffic(), 2),
            }
        })
        .collect())
}

/// Quantile with linear interpolation between closest ranks. `None` for an
/// empty input.
pub fn quantile_of(values: &[f64], q: f64) -> Result<Option<f64>> {
    if !(0.0..=1.0).contains(&q) {
        return Err(SiteError::InvalidInput(format!(
            "quantile must be within [0, 1], got {}",
            q
        )));
    }
    if values.is_empty() {
        return Ok(None);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Ok(Some(
        sorted[lower] + (sorted[upper] - sorted[lower]) * fraction,
    ))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::aggregate::CellAggregate;
    use crate::compute::grid::{CellId, GridCell};
    use crate::pipeline::{Diagnostic, RunStats};
    use geo::{Point, Rect};

    fn cell(id: usize, traffic: f64) -> ScoredCell {
        let x = id as f64 * 200.0;
        ScoredCell {
            aggregate: CellAggregate {
                cell: GridCell {
                    id: CellId(id),
                    row: 0,
                    col: id,
                    rect: Rect::new(
                        geo::coord! { x: x, y: 0.0 },
                        geo::coord! { x: x + 200.0, y: 200.0 },
                    ),
                },
                total_traffic: traffic,
                traffic_density: 1.0,
                segment_count: 1,
            },
            traffic_norm: 0.0,
            density_norm: 0.0,
            score: 0.0,
            nearest_facility_distance: None,
        }
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile_of(&values, 0.0).unwrap(), Some(1.0));
        assert_eq!(quantile_of(&values, 1.0).unwrap(), Some(4.0));
        assert_eq!(quantile_of(&values, 0.75).unwrap(), Some(3.25));
        assert_eq!(quantile_of(&[], 0.5).unwrap(), None);
        assert!(quantile_of(&values, 1.5).is_err());
    }

    #[test]
    fn test_heatmap_keeps_top_quartile() {
        let grid: Vec<ScoredCell> = (0..5).map(|i| cell(i, (i + 1) as f64 * 100.0)).collect();
        let points = heatmap_points(&grid, 0.75).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].weight, 400.0);
        assert_eq!((points[1].x, points[1].y), (900.0, 100.0));
    }

    #[test]
    fn test_summary_serializes() {
        let report = SitingReport {
            grid: vec![cell(0, 123.456)],
            candidates: Vec::new(),
            diagnostics: vec![Diagnostic::NoViableSites {
                excluded: 1,
                min_distance: 300.0,
            }],
            stats: RunStats::default(),
        };
        let facilities = vec![
            ExistingFacility::new(Point::new(1.0, 2.0)),
            ExistingFacility::new(Point::new(3.0, 4.0)).with_label("Main St 5"),
        ];

        let summary = SitingSummary::from_report(&report, &facilities).unwrap();
        assert_eq!(summary.heatmap[0].weight, 123.46);
        assert_eq!(summary.facilities[0].label, DEFAULT_FACILITY_LABEL);
        assert_eq!(summary.facilities[1].label, "Main St 5");
        assert_eq!(summary.notes.len(), 1);

        let json = summary.to_json().unwrap();
        assert!(json.contains("\"recommended\":[]"));
    }
}
