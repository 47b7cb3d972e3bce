use geo::{BoundingRect, Euclidean, Intersects, Length, LineString, Point, Rect};
use serde::{Deserialize, Serialize};

/// Geometry carried by a demand record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentGeometry {
    /// A single observation point.
    Point(Point),
    /// A street segment.
    Line(LineString),
}

impl SegmentGeometry {
    /// Planar length in coordinate units. Points have zero length.
    pub fn length(&self) -> f64 {
        match self {
            SegmentGeometry::Point(_) => 0.0,
            SegmentGeometry::Line(line) => Euclidean.length(line),
        }
    }

    /// Bounding rectangle, `None` for a line string without coordinates.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            SegmentGeometry::Point(point) => Some(point.bounding_rect()),
            SegmentGeometry::Line(line) => line.bounding_rect(),
        }
    }

    /// True when the geometry touches `rect`, boundary contact included.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        match self {
            SegmentGeometry::Point(point) => point.intersects(rect),
            SegmentGeometry::Line(line) => line.intersects(rect),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SegmentGeometry::Point(_) => false,
            SegmentGeometry::Line(line) => line.0.is_empty(),
        }
    }

    /// Iterate over every coordinate of the geometry.
    pub fn coords(&self) -> Box<dyn Iterator<Item = geo::Coord> + '_> {
        match self {
            SegmentGeometry::Point(point) => Box::new(std::iter::once(point.0)),
            SegmentGeometry::Line(line) => Box::new(line.coords().copied()),
        }
    }
}

/// A street segment (or point) with observed foot traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSegment {
    pub geometry: SegmentGeometry,
    pub weekday_traffic: f64,
    pub weekend_traffic: f64,
}

impl DemandSegment {
    pub fn new(geometry: SegmentGeometry, weekday_traffic: f64, weekend_traffic: f64) -> Self {
        Self {
            geometry,
            weekday_traffic,
            weekend_traffic,
        }
    }

    /// Create a demand record for a street segment.
    pub fn line(line: LineString, weekday_traffic: f64, weekend_traffic: f64) -> Self {
        Self::new(SegmentGeometry::Line(line), weekday_traffic, weekend_traffic)
    }

    /// Create a demand record observed at a single point.
    pub fn point(point: Point, weekday_traffic: f64, weekend_traffic: f64) -> Self {
        Self::new(SegmentGeometry::Point(point), weekday_traffic, weekend_traffic)
    }

    pub fn total_traffic(&self) -> f64 {
        self.weekday_traffic + self.weekend_traffic
    }

    pub fn segment_length(&self) -> f64 {
        self.geometry.length()
    }

    /// Traffic per meter of street, damped by one meter so that points and
    /// very short segments stay finite.
    pub fn traffic_density(&self) -> f64 {
        self.total_traffic() / (self.segment_length() + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_features() {
        let segment = DemandSegment::line(
            LineString::from(vec![(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)]),
            100.0,
            10.0,
        );

        assert_eq!(segment.total_traffic(), 110.0);
        assert!((segment.segment_length() - 11.0).abs() < 1e-12);
        assert!((segment.traffic_density() - 110.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_features() {
        let segment = DemandSegment::point(Point::new(5.0, 5.0), 40.0, 20.0);
        assert_eq!(segment.segment_length(), 0.0);
        assert_eq!(segment.traffic_density(), 60.0);
    }

    #[test]
    fn test_intersects_rect_on_boundary() {
        let rect = Rect::new(geo::coord! { x: 0.0, y: 0.0 }, geo::coord! { x: 10.0, y: 10.0 });
        let touching = SegmentGeometry::Line(LineString::from(vec![(10.0, 2.0), (20.0, 2.0)]));
        let outside = SegmentGeometry::Line(LineString::from(vec![(11.0, 2.0), (20.0, 2.0)]));

        assert!(touching.intersects_rect(&rect));
        assert!(!outside.intersects_rect(&rect));
        assert!(SegmentGeometry::Point(Point::new(0.0, 10.0)).intersects_rect(&rect));
    }

    #[test]
    fn test_empty_line_has_no_bounds() {
        let geometry = SegmentGeometry::Line(LineString::new(vec![]));
        assert!(geometry.is_empty());
        assert!(geometry.bounding_rect().is_none());
    }

    #[test]
    fn test_serde_shape() {
        let segment = DemandSegment::point(Point::new(1.0, 2.0), 3.0, 4.0);
        let json = serde_json::to_string(&segment).unwrap();
        let back: DemandSegment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, segment);
        assert!(json.contains("\"point\""));
    }
}
