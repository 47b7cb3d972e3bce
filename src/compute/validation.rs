//! Validation for planar input coordinates and traffic attributes.

use crate::error::{Result, SiteError};
use geo::Point;
use sitescore_types::{DemandSegment, ExistingFacility};

/// Validates that a planar point has finite coordinates.
///
/// # Examples
///
/// ```
/// use sitescore::compute::validation::validate_planar_point;
/// use geo::Point;
///
/// assert!(validate_planar_point(&Point::new(512_300.0, 4_761_000.0)).is_ok());
/// assert!(validate_planar_point(&Point::new(f64::NAN, 0.0)).is_err());
/// ```
pub fn validate_planar_point(point: &Point) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !x.is_finite() {
        return Err(SiteError::InvalidInput(format!(
            "x coordinate must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(SiteError::InvalidInput(format!(
            "y coordinate must be finite, got: {}",
            y
        )));
    }

    Ok(())
}

/// Validates a traffic count: finite and non-negative.
pub fn validate_traffic(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SiteError::InvalidInput(format!(
            "{} must be finite and non-negative, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates a single demand record.
pub fn validate_segment(segment: &DemandSegment) -> Result<()> {
    if segment.geometry.is_empty() {
        return Err(SiteError::InvalidInput(
            "geometry has no coordinates".to_string(),
        ));
    }

    for coord in segment.geometry.coords() {
        validate_planar_point(&Point::from(coord))?;
    }

    validate_traffic("weekday_traffic", segment.weekday_traffic)?;
    validate_traffic("weekend_traffic", segment.weekend_traffic)
}

/// Validates every demand record, naming the first offending index.
pub fn validate_segments(segments: &[DemandSegment]) -> Result<()> {
    for (idx, segment) in segments.iter().enumerate() {
        validate_segment(segment)
            .map_err(|e| SiteError::InvalidInput(format!("Segment at index {}: {}", idx, e)))?;
    }
    Ok(())
}

/// Validates every facility location.
pub fn validate_facilities(facilities: &[ExistingFacility]) -> Result<()> {
    for (idx, facility) in facilities.iter().enumerate() {
        validate_planar_point(&facility.location)
            .map_err(|e| SiteError::InvalidInput(format!("Facility at index {}: {}", idx, e)))?;
    }
    Ok(())
}
