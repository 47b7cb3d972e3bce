//! Uniform tessellation of the demand extent into square cells.
//!
//! Cells are numbered row-major starting from the lower-left corner:
//! `id = row * cols + col`, where row 0 starts at the minimum y of the extent
//! and column 0 at the minimum x. Every cell is a full `cell_size` square, so
//! the last row and column may overhang the extent when it is not an exact
//! multiple of the cell size.
//!
//! ```rust
//! use sitescore::compute::grid::build_grid;
//! use sitescore_types::BoundingBox2D;
//!
//! let grid = build_grid(&BoundingBox2D::new(0.0, 0.0, 500.0, 180.0), 200.0, 1_000)?;
//! assert_eq!((grid.rows(), grid.cols()), (1, 3));
//! assert_eq!(grid.len(), 3);
//! # Ok::<(), sitescore::SiteError>(())
//! ```

use crate::error::{Result, SiteError};
use geo::{Point, Polygon, Rect};
use serde::{Deserialize, Serialize};
use sitescore_types::BoundingBox2D;
use std::fmt;

/// Stable identifier of a cell within one tessellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub usize);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// One square of the tessellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub id: CellId,
    pub row: usize,
    pub col: usize,
    pub rect: Rect,
}

impl GridCell {
    pub fn centroid(&self) -> Point {
        Point::from(self.rect.center())
    }

    pub fn polygon(&self) -> Polygon {
        self.rect.to_polygon()
    }
}

/// An ordered, gap-free tessellation.
#[derive(Debug, Clone)]
pub struct Grid {
    cell_size: f64,
    rows: usize,
    cols: usize,
    cells: Vec<GridCell>,
}

impl Grid {
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in identifier order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> Option<&GridCell> {
        self.cells.get(id.0)
    }

    /// Area covered by the union of all cells.
    pub fn coverage(&self) -> BoundingBox2D {
        let first = self.cells[0].rect;
        let last = self.cells[self.cells.len() - 1].rect;
        BoundingBox2D::new(first.min().x, first.min().y, last.max().x, last.max().y)
    }
}

/// Number of `cell_size` steps needed to get from `min` to `max`.
fn steps(min: f64, max: f64, cell_size: f64) -> f64 {
    let mut n = ((max - min) / cell_size).ceil().max(1.0);
    // ceil of a rounded quotient can fall one step short of the far edge
    if min + n * cell_size < max {
        n += 1.0;
    }
    n
}

/// Tessellate `extent` into squares of side `cell_size`.
///
/// A zero-width or zero-height extent still produces one row or column, so
/// a single point yields a single cell anchored at that point.
///
/// # Errors
///
/// `InvalidGridConfiguration` when `cell_size` is not a positive finite
/// number, when the extent is not finite, or when the tessellation would
/// exceed `max_cells`.
pub fn build_grid(extent: &BoundingBox2D, cell_size: f64, max_cells: usize) -> Result<Grid> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(SiteError::InvalidGridConfiguration(format!(
            "cell size must be a positive number of meters, got {}",
            cell_size
        )));
    }

    let (xmin, ymin) = (extent.min_x(), extent.min_y());
    if ![xmin, ymin, extent.max_x(), extent.max_y()]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err(SiteError::InvalidGridConfiguration(
            "extent must have finite coordinates".to_string(),
        ));
    }

    let cols = steps(xmin, extent.max_x(), cell_size);
    let rows = steps(ymin, extent.max_y(), cell_size);

    if cols * rows > max_cells as f64 {
        return Err(SiteError::InvalidGridConfiguration(format!(
            "{} x {} cells of {} m exceeds the limit of {} cells",
            rows, cols, cell_size, max_cells
        )));
    }

    let (rows, cols) = (rows as usize, cols as usize);
    let x_edge = |i: usize| xmin + i as f64 * cell_size;
    let y_edge = |j: usize| ymin + j as f64 * cell_size;

    let mut cells = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            cells.push(GridCell {
                id: CellId(row * cols + col),
                row,
                col,
                rect: Rect::new(
                    geo::coord! { x: x_edge(col), y: y_edge(row) },
                    geo::coord! { x: x_edge(col + 1), y: y_edge(row + 1) },
                ),
            });
        }
    }

    log::debug!(
        "Built {} x {} grid ({} cells of {} m)",
        rows,
        cols,
        cells.len(),
        cell_size
    );

    Ok(Grid {
        cell_size,
        rows,
        cols,
        cells,
    })
}
