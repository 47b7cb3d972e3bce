use geo::Rect;
use serde::{Deserialize, Serialize};

/// A 2D axis-aligned bounding box in planar coordinates.
///
/// Wraps `geo::Rect`; `Rect::new` normalises corner order, so the minimum
/// corner is always the lower-left one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    /// The underlying geometric rectangle
    pub rect: Rect,
}

impl BoundingBox2D {
    /// Create a new bounding box from minimum and maximum coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitescore_types::bbox::BoundingBox2D;
    ///
    /// let bbox = BoundingBox2D::new(0.0, 0.0, 400.0, 250.0);
    /// assert_eq!(bbox.width(), 400.0);
    /// assert_eq!(bbox.height(), 250.0);
    /// ```
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            rect: Rect::new(
                geo::coord! { x: min_x, y: min_y },
                geo::coord! { x: max_x, y: max_y },
            ),
        }
    }

    /// Create a bounding box from a `geo::Rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self { rect }
    }

    /// Smallest box containing every rectangle, or `None` for an empty input.
    pub fn covering<'a, I>(rects: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        let mut iter = rects.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::from_rect(first), |acc, rect| {
            acc.union(&Self::from_rect(*rect))
        }))
    }

    pub fn min_x(&self) -> f64 {
        self.rect.min().x
    }

    pub fn min_y(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_x(&self) -> f64 {
        self.rect.max().x
    }

    pub fn max_y(&self) -> f64 {
        self.rect.max().y
    }

    pub fn width(&self) -> f64 {
        self.max_x() - self.min_x()
    }

    pub fn height(&self) -> f64 {
        self.max_y() - self.min_y()
    }

    /// Check if this box fully contains another one.
    pub fn contains(&self, other: &BoundingBox2D) -> bool {
        self.min_x() <= other.min_x()
            && self.min_y() <= other.min_y()
            && self.max_x() >= other.max_x()
            && self.max_y() >= other.max_y()
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox2D) -> BoundingBox2D {
        BoundingBox2D::new(
            self.min_x().min(other.min_x()),
            self.min_y().min(other.min_y()),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_order_is_normalised() {
        let bbox = BoundingBox2D::new(10.0, 20.0, 0.0, 5.0);
        assert_eq!(bbox.min_x(), 0.0);
        assert_eq!(bbox.min_y(), 5.0);
        assert_eq!(bbox.max_x(), 10.0);
        assert_eq!(bbox.max_y(), 20.0);
    }

    #[test]
    fn test_covering_rects() {
        let rects = [
            Rect::new(geo::coord! { x: 0.0, y: 0.0 }, geo::coord! { x: 1.0, y: 1.0 }),
            Rect::new(
                geo::coord! { x: -5.0, y: 2.0 },
                geo::coord! { x: -4.0, y: 8.0 },
            ),
        ];

        let bbox = BoundingBox2D::covering(rects.iter()).unwrap();
        assert_eq!(bbox, BoundingBox2D::new(-5.0, 0.0, 1.0, 8.0));
        assert!(BoundingBox2D::covering(std::iter::empty()).is_none());
    }

    #[test]
    fn test_contains_includes_shared_edges() {
        let outer = BoundingBox2D::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains(&BoundingBox2D::new(0.0, 50.0, 100.0, 100.0)));
        assert!(!outer.contains(&BoundingBox2D::new(0.0, 50.0, 100.1, 100.0)));
    }
}
