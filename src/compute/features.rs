//! Per-segment demand metrics.
//!
//! Segment lengths are measured in the planar input system, so inputs must
//! already be projected into a distance-true coordinate system.

use crate::compute::validation::{validate_segment, validate_segments};
use crate::error::{Result, SiteError};
use geo::Rect;
use sitescore_types::{BoundingBox2D, DemandSegment, SegmentGeometry};

/// A validated demand segment together with its derived metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFeatures<'a> {
    pub geometry: &'a SegmentGeometry,
    pub total_traffic: f64,
    pub segment_length: f64,
    pub traffic_density: f64,
    pub bounds: Rect,
}

impl<'a> SegmentFeatures<'a> {
    /// Validate `segment` and derive its metrics.
    pub fn from_segment(segment: &'a DemandSegment) -> Result<Self> {
        validate_segment(segment)?;
        Self::derive(segment)
    }

    fn derive(segment: &'a DemandSegment) -> Result<Self> {
        let bounds = segment
            .geometry
            .bounding_rect()
            .ok_or_else(|| SiteError::InvalidInput("geometry has no coordinates".to_string()))?;

        // finite counts can still overflow once summed
        let total_traffic = segment.total_traffic();
        if !total_traffic.is_finite() {
            return Err(SiteError::InvalidInput(format!(
                "total_traffic must be finite, got: {}",
                total_traffic
            )));
        }

        let traffic_density = segment.traffic_density();
        if !traffic_density.is_finite() {
            return Err(SiteError::InvalidInput(format!(
                "traffic_density must be finite, got: {}",
                traffic_density
            )));
        }

        Ok(Self {
            geometry: &segment.geometry,
            total_traffic,
            segment_length: segment.segment_length(),
            traffic_density,
            bounds,
        })
    }
}

/// Derive metrics for every segment. Fails on the first invalid record.
pub fn derive_features(segments: &[DemandSegment]) -> Result<Vec<SegmentFeatures<'_>>> {
    validate_segments(segments)?;

    segments
        .iter()
        .enumerate()
        .map(|(idx, segment)| {
            SegmentFeatures::derive(segment)
                .map_err(|e| SiteError::InvalidInput(format!("Segment at index {}: {}", idx, e)))
        })
        .collect()
}

/// Total bounds of all segments, `None` when there are none.
pub fn extent(features: &[SegmentFeatures<'_>]) -> Option<BoundingBox2D> {
    BoundingBox2D::covering(features.iter().map(|f| &f.bounds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point};

    #[test]
    fn test_derived_metrics() {
        let segments = vec![
            DemandSegment::line(LineString::from(vec![(0.0, 0.0), (0.0, 99.0)]), 150.0, 50.0),
            DemandSegment::point(Point::new(300.0, -20.0), 10.0, 0.0),
        ];

        let features = derive_features(&segments).unwrap();
        assert_eq!(features[0].total_traffic, 200.0);
        assert_eq!(features[0].segment_length, 99.0);
        assert_eq!(features[0].traffic_density, 2.0);
        assert_eq!(features[1].traffic_density, 10.0);

        let bbox = extent(&features).unwrap();
        assert_eq!(bbox, BoundingBox2D::new(0.0, -20.0, 300.0, 99.0));
    }

    #[test]
    fn test_invalid_record_reports_index() {
        let segments = vec![
            DemandSegment::point(Point::new(0.0, 0.0), 1.0, 1.0),
            DemandSegment::point(Point::new(0.0, 0.0), -3.0, 1.0),
        ];
        let err = derive_features(&segments).unwrap_err();
        assert!(matches!(err, SiteError::InvalidInput(ref msg) if msg.contains("index 1")));
    }

    #[test]
    fn test_overflowing_total_traffic_rejected() {
        let busy = DemandSegment::point(Point::new(0.0, 0.0), f64::MAX, f64::MAX);
        let err = SegmentFeatures::from_segment(&busy).unwrap_err();
        assert!(err.to_string().contains("total_traffic"));

        let segments = vec![
            DemandSegment::point(Point::new(500.0, 500.0), 100.0, 0.0),
            busy,
        ];
        let err = derive_features(&segments).unwrap_err();
        assert!(matches!(err, SiteError::InvalidInput(ref msg) if msg.contains("index 1")));
    }

    #[test]
    fn test_empty_extent() {
        assert!(extent(&[]).is_none());
    }
}
