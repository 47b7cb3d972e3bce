//! The end-to-end siting pipeline.
//!
//! Stages run strictly in order, each consuming the previous stage's output:
//!
//! ```text
//! Raw → Aggregated → Filtered(floor) → Scored → Filtered(proximity) → Selected
//! ```
//!
//! A failing stage aborts the run with a [`SiteError`]. Empty but valid
//! outcomes (every cell excluded, fewer candidates than requested) complete
//! normally and are reported as [`Diagnostic`]s on the [`SitingReport`].
//!
//! ```rust
//! use geo::{LineString, Point};
//! use sitescore::{Config, SitingPipeline};
//! use sitescore_types::{DemandSegment, ExistingFacility};
//!
//! let segments = vec![
//!     DemandSegment::line(LineString::from(vec![(0.0, 0.0), (150.0, 0.0)]), 400.0, 200.0),
//!     DemandSegment::line(LineString::from(vec![(900.0, 0.0), (990.0, 0.0)]), 100.0, 20.0),
//! ];
//! let facilities = vec![ExistingFacility::new(Point::new(2_000.0, 2_000.0))];
//!
//! let report = SitingPipeline::new(Config::default())?.run(&segments, &facilities)?;
//! assert_eq!(report.candidates.len(), 2);
//! assert!((report.candidates[0].score - 1.0).abs() < 1e-12);
//! # Ok::<(), sitescore::SiteError>(())
//! ```

use crate::compute::aggregate::{aggregate, apply_traffic_floor};
use crate::compute::features::{derive_features, extent};
use crate::compute::grid::build_grid;
use crate::compute::proximity::{FacilityIndex, exclude_within};
use crate::compute::scoring::{ScoredCell, score_cells};
use crate::compute::selection::{Candidate, select_diversified};
use crate::config::Config;
use crate::error::{Result, SiteError};
use serde::Serialize;
use sitescore_types::{DemandSegment, ExistingFacility};
use std::fmt;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Raw,
    Aggregated,
    FloorFiltered,
    Scored,
    ProximityFiltered,
    Selected,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Raw => "raw",
            Stage::Aggregated => "aggregated",
            Stage::FloorFiltered => "filtered(floor)",
            Stage::Scored => "scored",
            Stage::ProximityFiltered => "filtered(proximity)",
            Stage::Selected => "selected",
        };
        f.write_str(name)
    }
}

/// Non-fatal outcomes worth surfacing to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Candidates existed, but every one lies within `min_distance` of a facility.
    NoViableSites { excluded: usize, min_distance: f64 },
    /// Spacing or supply left fewer candidates than requested.
    CandidatesExhausted { requested: usize, selected: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoViableSites {
                excluded,
                min_distance,
            } => write!(
                f,
                "no viable sites: all {} scored cells are within {} m of an existing facility",
                excluded, min_distance
            ),
            Diagnostic::CandidatesExhausted {
                requested,
                selected,
            } => write!(
                f,
                "candidates exhausted: selected {} of {} requested",
                selected, requested
            ),
        }
    }
}

/// Cell counts observed along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub segments: usize,
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub cells_generated: usize,
    pub cells_with_traffic: usize,
    pub cells_above_floor: usize,
    pub cells_excluded: usize,
    pub cells_eligible: usize,
    pub candidates_selected: usize,
}

/// Output of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct SitingReport {
    /// Every cell above the traffic floor, scored and annotated with its
    /// nearest-facility distance, in cell id order. Intended for heatmaps.
    pub grid: Vec<ScoredCell>,
    /// Recommended sites in acceptance order.
    pub candidates: Vec<Candidate>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: RunStats,
}

impl SitingReport {
    /// True when the proximity filter removed every scored cell.
    pub fn no_viable_sites(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::NoViableSites { .. }))
    }
}

/// A validated configuration ready to run.
#[derive(Debug, Clone)]
pub struct SitingPipeline {
    config: Config,
}

impl SitingPipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Score the demand grid and select new sites.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for malformed segments or facility locations
    /// - `InvalidGridConfiguration` when the grid cannot be built
    /// - `EmptyCandidateSet` when there are no segments, or no cell clears the traffic floor
    /// - `EmptyFacilitySet` when `facilities` is empty
    pub fn run(
        &self,
        segments: &[DemandSegment],
        facilities: &[ExistingFacility],
    ) -> Result<SitingReport> {
        let config = &self.config;
        let mut stats = RunStats {
            segments: segments.len(),
            ..RunStats::default()
        };

        if segments.is_empty() {
            return Err(SiteError::EmptyCandidateSet(
                "no demand segments supplied".to_string(),
            ));
        }

        let features = derive_features(segments)?;
        let bounds = extent(&features).ok_or_else(|| {
            SiteError::EmptyCandidateSet("demand segments have no extent".to_string())
        })?;

        let grid = build_grid(&bounds, config.grid_size, config.max_cells)?;
        stats.grid_rows = grid.rows();
        stats.grid_cols = grid.cols();
        stats.cells_generated = grid.len();

        let aggregated = aggregate(&grid, &features);
        stats.cells_with_traffic = aggregated.len();
        log_transition(Stage::Raw, Stage::Aggregated, aggregated.len());

        let above_floor = apply_traffic_floor(aggregated, config.traffic_floor);
        stats.cells_above_floor = above_floor.len();
        log_transition(Stage::Aggregated, Stage::FloorFiltered, above_floor.len());

        let mut scored = score_cells(above_floor, &config.score_weights)?;
        log_transition(Stage::FloorFiltered, Stage::Scored, scored.len());

        let index = FacilityIndex::new(facilities)?;
        index.annotate(&mut scored);

        let outcome = exclude_within(scored.clone(), config.min_distance);
        stats.cells_excluded = outcome.excluded;
        stats.cells_eligible = outcome.kept.len();
        log_transition(Stage::Scored, Stage::ProximityFiltered, outcome.kept.len());

        let mut diagnostics = Vec::new();
        if outcome.kept.is_empty() {
            let diagnostic = Diagnostic::NoViableSites {
                excluded: outcome.excluded,
                min_distance: config.min_distance,
            };
            log::warn!("{}", diagnostic);
            diagnostics.push(diagnostic);

            return Ok(SitingReport {
                grid: scored,
                candidates: Vec::new(),
                diagnostics,
                stats,
            });
        }

        let candidates = select_diversified(
            &outcome.kept,
            config.top_n,
            config.mutual_exclusion_radius,
        );
        stats.candidates_selected = candidates.len();
        log_transition(Stage::ProximityFiltered, Stage::Selected, candidates.len());

        if candidates.len() < config.top_n {
            diagnostics.push(Diagnostic::CandidatesExhausted {
                requested: config.top_n,
                selected: candidates.len(),
            });
        }

        log::info!(
            "Recommended {} sites from {} segments ({} scored cells, {} excluded near {} facilities)",
            candidates.len(),
            stats.segments,
            scored.len(),
            stats.cells_excluded,
            index.len()
        );

        Ok(SitingReport {
            grid: scored,
            candidates,
            diagnostics,
            stats,
        })
    }
}

fn log_transition(from: Stage, to: Stage, cells: usize) {
    log::debug!("Stage {} -> {}: {} cells", from, to, cells);
}

/// Run the pipeline once with `config`.
pub fn recommend_sites(
    segments: &[DemandSegment],
    facilities: &[ExistingFacility],
    config: &Config,
) -> Result<SitingReport> {
    SitingPipeline::new(config.clone())?.run(segments, facilities)
}
