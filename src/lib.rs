//! Facility siting from street foot-traffic.
//!
//! Tessellates the demand area into a uniform grid, aggregates segment
//! traffic per cell, scores cells by normalised traffic and density, drops
//! cells too close to existing facilities, and greedily picks a spaced-out
//! set of top-scoring sites.
//!
//! ```rust
//! use geo::{LineString, Point};
//! use sitescore::{PipelineBuilder, SitingSummary};
//! use sitescore_types::{DemandSegment, ExistingFacility};
//!
//! let segments = vec![
//!     DemandSegment::line(LineString::from(vec![(0.0, 0.0), (120.0, 0.0)]), 900.0, 400.0),
//!     DemandSegment::line(LineString::from(vec![(1_500.0, 0.0), (1_550.0, 0.0)]), 200.0, 80.0),
//! ];
//! let facilities = vec![ExistingFacility::new(Point::new(1_600.0, 150.0)).with_label("Branch 12")];
//!
//! let pipeline = PipelineBuilder::new().top_n(5).build()?;
//! let report = pipeline.run(&segments, &facilities)?;
//!
//! // the second street is within 300 m of the existing branch
//! assert_eq!(report.candidates.len(), 1);
//! let summary = SitingSummary::from_report(&report, &facilities)?;
//! assert_eq!(summary.recommended[0].rank, 1);
//! # Ok::<(), sitescore::SiteError>(())
//! ```

pub mod builder;
pub mod cache;
pub mod compute;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;

pub use builder::PipelineBuilder;
pub use cache::{CacheStatus, ModelCache};
pub use config::{Config, ScoreWeights};
pub use error::{Result, SiteError};
pub use export::{HeatPoint, RecommendedSite, SitingSummary};
pub use pipeline::{Diagnostic, RunStats, SitingPipeline, SitingReport, Stage, recommend_sites};

pub use compute::grid::{CellId, Grid, GridCell};
pub use compute::scoring::ScoredCell;
pub use compute::selection::Candidate;

pub use sitescore_types::{BoundingBox2D, DemandSegment, ExistingFacility, SegmentGeometry};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{PipelineBuilder, Result, SiteError, SitingPipeline, SitingReport};

    pub use crate::{Candidate, Config, Diagnostic, ScoreWeights, ScoredCell};

    pub use crate::{DemandSegment, ExistingFacility, SegmentGeometry};

    pub use crate::{ModelCache, SitingSummary};

    pub use geo::{LineString, Point};
}
