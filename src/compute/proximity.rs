//! Nearest-facility index and hard exclusion around existing facilities.
//!
//! The index is an R-tree over facility locations, built once per run, with
//! O(log n) nearest-neighbour queries. Distances are planar (Euclidean) in
//! the input coordinate system.
//!
//! ## Boundary policy
//!
//! A cell survives exclusion only when its centroid is *strictly* farther
//! than `min_distance` from the nearest facility. A facility at exactly
//! `min_distance` excludes the cell.

use crate::compute::scoring::ScoredCell;
use crate::compute::validation::validate_facilities;
use crate::error::{Result, SiteError};
use geo::{Distance, Euclidean, Point};
use rstar::{Point as RstarPoint, RTree};
use sitescore_types::ExistingFacility;

/// Facility location for R-tree indexing.
#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexedFacility {
    x: f64,
    y: f64,
    index: usize,
}

impl RstarPoint for IndexedFacility {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self {
            x: generator(0),
            y: generator(1),
            index: 0,
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.x,
            1 => self.y,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => unreachable!(),
        }
    }
}

/// Result of a nearest-facility query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestFacility {
    /// Position of the facility in the slice the index was built from
    pub index: usize,
    pub distance: f64,
}

/// Cells left after exclusion, plus how many were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionOutcome {
    pub kept: Vec<ScoredCell>,
    pub excluded: usize,
}

/// Static nearest-neighbour index over existing facilities.
pub struct FacilityIndex<'a> {
    facilities: &'a [ExistingFacility],
    tree: RTree<IndexedFacility>,
}

impl<'a> FacilityIndex<'a> {
    /// Build the index.
    ///
    /// # Errors
    ///
    /// `EmptyFacilitySet` when `facilities` is empty, `InvalidInput` when a
    /// location is not finite.
    pub fn new(facilities: &'a [ExistingFacility]) -> Result<Self> {
        if facilities.is_empty() {
            return Err(SiteError::EmptyFacilitySet);
        }
        validate_facilities(facilities)?;

        let entries = facilities
            .iter()
            .enumerate()
            .map(|(index, facility)| IndexedFacility {
                x: facility.x(),
                y: facility.y(),
                index,
            })
            .collect();

        Ok(Self {
            facilities,
            tree: RTree::bulk_load(entries),
        })
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn facility(&self, index: usize) -> Option<&'a ExistingFacility> {
        self.facilities.get(index)
    }

    /// Closest facility to `point`.
    pub fn nearest(&self, point: &Point) -> Option<NearestFacility> {
        let query = IndexedFacility {
            x: point.x(),
            y: point.y(),
            index: 0,
        };

        self.tree.nearest_neighbor(&query).map(|found| NearestFacility {
            index: found.index,
            distance: Euclidean.distance(*point, self.facilities[found.index].location),
        })
    }

    /// Record the nearest-facility distance of every cell centroid.
    pub fn annotate(&self, cells: &mut [ScoredCell]) {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            cells.par_iter_mut().for_each(|cell| self.annotate_one(cell));
        }

        #[cfg(not(feature = "parallel"))]
        for cell in cells.iter_mut() {
            self.annotate_one(cell);
        }
    }

    fn annotate_one(&self, cell: &mut ScoredCell) {
        cell.nearest_facility_distance = self.nearest(&cell.centroid()).map(|n| n.distance);
    }
}

/// Drop cells whose centroid lies within `min_distance` of a facility.
///
/// Cells must have been annotated first; a cell without a measured distance
/// is kept.
pub fn exclude_within(cells: Vec<ScoredCell>, min_distance: f64) -> ExclusionOutcome {
    let before = cells.len();
    let kept: Vec<ScoredCell> = cells
        .into_iter()
        .filter(|cell| {
            cell.nearest_facility_distance
                .is_none_or(|distance| distance > min_distance)
        })
        .collect();
    let excluded = before - kept.len();

    log::debug!(
        "Proximity filter ({} m) excluded {} of {} cells",
        min_distance,
        excluded,
        before
    );

    ExclusionOutcome { kept, excluded }
}
