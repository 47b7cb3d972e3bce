//! Spatial join of demand segments onto grid cells.
//!
//! A segment contributes to every cell its geometry touches, not only the
//! cell holding its centroid; a street crossing a cell boundary counts
//! towards both sides. Candidate cells come from an R-tree over the cell
//! rectangles and are confirmed with an exact intersection test.
//!
//! ## Empty-cell policy
//!
//! Cells that no segment touches are dropped from the result rather than
//! reported with zero traffic. The traffic floor applied afterwards only ever
//! sees cells with observed demand.

use crate::compute::features::SegmentFeatures;
use crate::compute::grid::{CellId, Grid, GridCell};
use geo::Point;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

type IndexedCell = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Demand aggregated over one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellAggregate {
    pub cell: GridCell,
    /// Sum of `total_traffic` over touching segments
    pub total_traffic: f64,
    /// Mean of `traffic_density` over touching segments
    pub traffic_density: f64,
    pub segment_count: usize,
}

impl CellAggregate {
    pub fn id(&self) -> CellId {
        self.cell.id
    }

    pub fn centroid(&self) -> Point {
        self.cell.centroid()
    }
}

/// Running sums for one cell. Merging is associative and commutative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Accumulator {
    traffic: f64,
    density: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, segment: &SegmentFeatures<'_>) {
        self.traffic += segment.total_traffic;
        self.density += segment.traffic_density;
        self.count += 1;
    }

    fn merge(&mut self, other: &Accumulator) {
        self.traffic += other.traffic;
        self.density += other.density;
        self.count += other.count;
    }
}

/// R-tree over the rectangles of a grid.
pub struct CellIndex<'g> {
    grid: &'g Grid,
    tree: RTree<IndexedCell>,
}

impl<'g> CellIndex<'g> {
    pub fn new(grid: &'g Grid) -> Self {
        let entries = grid
            .cells()
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let rect = Rectangle::from_corners(
                    [cell.rect.min().x, cell.rect.min().y],
                    [cell.rect.max().x, cell.rect.max().y],
                );
                GeomWithData::new(rect, idx)
            })
            .collect();

        Self {
            grid,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Positions (in grid order) of every cell the segment touches.
    pub fn cells_touching(&self, segment: &SegmentFeatures<'_>) -> SmallVec<[usize; 4]> {
        let envelope = AABB::from_corners(
            [segment.bounds.min().x, segment.bounds.min().y],
            [segment.bounds.max().x, segment.bounds.max().y],
        );

        let cells = self.grid.cells();
        let mut hits: SmallVec<[usize; 4]> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .filter(|&idx| segment.geometry.intersects_rect(&cells[idx].rect))
            .collect();
        hits.sort_unstable();
        hits
    }

    fn accumulate_into(
        &self,
        totals: &mut FxHashMap<usize, Accumulator>,
        segment: &SegmentFeatures<'_>,
    ) {
        for idx in self.cells_touching(segment) {
            totals.entry(idx).or_default().add(segment);
        }
    }
}

/// Below this many segments the join stays on the calling thread.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_SEGMENTS: usize = 1_024;

fn accumulate(
    index: &CellIndex<'_>,
    segments: &[SegmentFeatures<'_>],
) -> FxHashMap<usize, Accumulator> {
    #[cfg(feature = "parallel")]
    if segments.len() >= PARALLEL_MIN_SEGMENTS {
        return accumulate_parallel(index, segments);
    }

    accumulate_sequential(index, segments)
}

fn accumulate_sequential(
    index: &CellIndex<'_>,
    segments: &[SegmentFeatures<'_>],
) -> FxHashMap<usize, Accumulator> {
    let mut totals = FxHashMap::default();
    for segment in segments {
        index.accumulate_into(&mut totals, segment);
    }
    totals
}

#[cfg(feature = "parallel")]
fn accumulate_parallel(
    index: &CellIndex<'_>,
    segments: &[SegmentFeatures<'_>],
) -> FxHashMap<usize, Accumulator> {
    use rayon::prelude::*;

    segments
        .par_iter()
        .fold(FxHashMap::default, |mut totals, segment| {
            index.accumulate_into(&mut totals, segment);
            totals
        })
        .reduce(FxHashMap::default, |mut left, right| {
            for (idx, acc) in right {
                left.entry(idx).or_default().merge(&acc);
            }
            left
        })
}

/// Join `segments` onto `grid` and aggregate demand per cell.
///
/// Returns only the cells touched by at least one segment, in grid order.
pub fn aggregate(grid: &Grid, segments: &[SegmentFeatures<'_>]) -> Vec<CellAggregate> {
    let index = CellIndex::new(grid);
    let totals = accumulate(&index, segments);

    let mut touched: Vec<(usize, Accumulator)> = totals.into_iter().collect();
    touched.sort_unstable_by_key(|(idx, _)| *idx);

    log::debug!(
        "Joined {} segments onto {} of {} cells",
        segments.len(),
        touched.len(),
        grid.len()
    );

    touched
        .into_iter()
        .map(|(idx, acc)| CellAggregate {
            cell: grid.cells()[idx],
            total_traffic: acc.traffic,
            traffic_density: acc.density / acc.count as f64,
            segment_count: acc.count,
        })
        .collect()
}

/// Keep cells whose aggregate traffic is strictly above `floor`.
pub fn apply_traffic_floor(cells: Vec<CellAggregate>, floor: f64) -> Vec<CellAggregate> {
    let before = cells.len();
    let kept: Vec<CellAggregate> = cells
        .into_iter()
        .filter(|cell| cell.total_traffic > floor)
        .collect();

    log::debug!(
        "Traffic floor {} kept {} of {} cells",
        floor,
        kept.len(),
        before
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::features::derive_features;
    use crate::compute::grid::build_grid;
    use geo::LineString;
    use sitescore_types::{BoundingBox2D, DemandSegment};

    fn two_by_two() -> Grid {
        build_grid(&BoundingBox2D::new(0.0, 0.0, 400.0, 400.0), 200.0, 100).unwrap()
    }

    fn find(cells: &[CellAggregate], id: usize) -> &CellAggregate {
        cells.iter().find(|c| c.id() == CellId(id)).unwrap()
    }

    #[test]
    fn test_boundary_crossing_segment_counts_in_both_cells() {
        let grid = two_by_two();
        let segments = vec![
            // crosses x = 200 between cells 0 and 1
            DemandSegment::line(LineString::from(vec![(100.0, 100.0), (300.0, 100.0)]), 100.0, 50.0),
            // inside cell 0
            DemandSegment::line(LineString::from(vec![(50.0, 50.0), (50.0, 150.0)]), 30.0, 10.0),
            // the shared corner of all four cells
            DemandSegment::point(Point::new(200.0, 200.0), 5.0, 5.0),
        ];
        let features = derive_features(&segments).unwrap();
        let cells = aggregate(&grid, &features);

        assert_eq!(cells.len(), 4);
        assert_eq!(find(&cells, 0).total_traffic, 200.0);
        assert_eq!(find(&cells, 0).segment_count, 3);
        assert_eq!(find(&cells, 1).total_traffic, 160.0);
        assert_eq!(find(&cells, 2).total_traffic, 10.0);
        assert_eq!(find(&cells, 3).total_traffic, 10.0);

        let expected_density = (150.0 / 201.0 + 40.0 / 101.0 + 10.0) / 3.0;
        assert!((find(&cells, 0).traffic_density - expected_density).abs() < 1e-12);
    }

    #[test]
    fn test_untouched_cells_are_dropped() {
        let grid = two_by_two();
        let segments = vec![
            DemandSegment::point(Point::new(10.0, 10.0), 1.0, 1.0),
            DemandSegment::point(Point::new(390.0, 390.0), 1.0, 1.0),
        ];
        let features = derive_features(&segments).unwrap();
        let cells = aggregate(&grid, &features);

        let ids: Vec<CellId> = cells.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![CellId(0), CellId(3)]);
    }

    #[test]
    fn test_cells_touching_uses_exact_geometry() {
        let grid = build_grid(&BoundingBox2D::new(0.0, 0.0, 300.0, 300.0), 100.0, 100).unwrap();
        // diagonal from the lower-left to upper-right corner; its envelope covers
        // all nine cells but the line only touches the diagonal ones and the
        // cells sharing a corner with them
        let segments = vec![DemandSegment::line(
            LineString::from(vec![(0.0, 0.0), (300.0, 300.0)]),
            1.0,
            0.0,
        )];
        let features = derive_features(&segments).unwrap();
        let index = CellIndex::new(&grid);

        let hits = index.cells_touching(&features[0]);
        assert!(hits.contains(&0) && hits.contains(&4) && hits.contains(&8));
        assert!(!hits.contains(&2));
        assert!(!hits.contains(&6));
    }

    #[test]
    fn test_traffic_floor_is_strict() {
        let grid = two_by_two();
        let segments = vec![
            DemandSegment::point(Point::new(10.0, 10.0), 50.0, 0.0),
            DemandSegment::point(Point::new(390.0, 390.0), 50.0, 0.5),
        ];
        let features = derive_features(&segments).unwrap();
        let kept = apply_traffic_floor(aggregate(&grid, &features), 50.0);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), CellId(3));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_join_matches_sequential() {
        let segments: Vec<DemandSegment> = (0..5_000)
            .map(|i| {
                let x = (i % 97) as f64 * 31.0;
                let y = (i / 97) as f64 * 17.0;
                DemandSegment::line(
                    LineString::from(vec![(x, y), (x + 150.0, y + 40.0)]),
                    (i % 311) as f64 + 0.25,
                    (i % 53) as f64,
                )
            })
            .collect();
        let features = derive_features(&segments).unwrap();
        let grid = build_grid(&BoundingBox2D::new(0.0, 0.0, 3_200.0, 950.0), 200.0, 1_000).unwrap();
        let index = CellIndex::new(&grid);

        let sequential = accumulate_sequential(&index, &features);
        let parallel = accumulate_parallel(&index, &features);
        assert_eq!(sequential.len(), parallel.len());

        for (idx, seq) in &sequential {
            let par = &parallel[idx];
            assert_eq!(seq.count, par.count);
            assert!((seq.traffic - par.traffic).abs() <= 1e-9 * seq.traffic.max(1.0));
            assert!((seq.density - par.density).abs() <= 1e-9 * seq.density.max(1.0));
        }

        // the public entry point takes the parallel path at this size
        let cells = aggregate(&grid, &features);
        assert_eq!(cells.len(), sequential.len());
    }
}
