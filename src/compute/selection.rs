//! Greedy, diversified top-N selection.
//!
//! Policy: first-fit by descending score, no reconsideration. Cells are
//! visited from the highest score down (ties broken by ascending cell id),
//! and a cell is accepted iff its centroid is at least `radius` away from
//! every centroid accepted so far. A rejected cell is never revisited, and
//! an accepted one is never swapped out. This approximates a maximum-weight
//! independent set under a disk-packing constraint; it is not an optimal
//! solver.
//!
//! Each step checks the candidate against at most `top_n` accepted
//! centroids, so selection is O(n * top_n) distance computations.

use crate::compute::grid::CellId;
use crate::compute::scoring::ScoredCell;
use geo::{Distance, Euclidean, Point};
use serde::Serialize;

/// A cell promoted to the recommended set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub cell_id: CellId,
    pub row: usize,
    pub col: usize,
    pub centroid: Point,
    pub score: f64,
    pub total_traffic: f64,
    pub traffic_density: f64,
    pub nearest_facility_distance: Option<f64>,
}

impl Candidate {
    fn from_cell(cell: &ScoredCell) -> Self {
        Self {
            cell_id: cell.id(),
            row: cell.aggregate.cell.row,
            col: cell.aggregate.cell.col,
            centroid: cell.centroid(),
            score: cell.score,
            total_traffic: cell.total_traffic(),
            traffic_density: cell.traffic_density(),
            nearest_facility_distance: cell.nearest_facility_distance,
        }
    }
}

/// Order in which cells are considered: score descending, then id ascending.
pub fn ranking(cells: &[ScoredCell]) -> Vec<&ScoredCell> {
    let mut order: Vec<&ScoredCell> = cells.iter().collect();
    order.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id().cmp(&b.id())));
    order
}

/// Select up to `top_n` cells spaced at least `radius` apart.
///
/// Returns candidates in acceptance order. Fewer than `top_n` are returned
/// when the cells run out first.
pub fn select_diversified(cells: &[ScoredCell], top_n: usize, radius: f64) -> Vec<Candidate> {
    let mut selected: Vec<Candidate> = Vec::with_capacity(top_n.min(cells.len()));
    let mut skipped = 0usize;

    for cell in ranking(cells) {
        if selected.len() >= top_n {
            break;
        }

        let centroid = cell.centroid();
        let clear = selected
            .iter()
            .all(|accepted| Euclidean.distance(accepted.centroid, centroid) >= radius);

        if clear {
            selected.push(Candidate::from_cell(cell));
        } else {
            skipped += 1;
        }
    }

    log::debug!(
        "Selected {} of {} requested candidates ({} skipped for spacing)",
        selected.len(),
        top_n,
        skipped
    );

    selected
}
