//! GeoJSON output for the scored grid and the recommended sites.
//!
//! Coordinates are written as-is in the planar input system.

use crate::compute::scoring::ScoredCell;
use crate::compute::selection::Candidate;
use crate::error::Result;
use geo::Polygon;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

fn polygon_value(polygon: &Polygon) -> Value {
    let exterior: Vec<Vec<f64>> = polygon
        .exterior()
        .coords()
        .map(|coord| vec![coord.x, coord.y])
        .collect();
    Value::Polygon(vec![exterior])
}

fn feature(geometry: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// One polygon feature per scored cell.
pub fn grid_to_geojson(grid: &[ScoredCell]) -> FeatureCollection {
    let features = grid
        .iter()
        .map(|cell| {
            let mut properties = JsonObject::new();
            properties.insert("cell_id".to_string(), JsonValue::from(cell.id().0));
            properties.insert(
                "total_traffic".to_string(),
                JsonValue::from(cell.total_traffic()),
            );
            properties.insert(
                "traffic_density".to_string(),
                JsonValue::from(cell.traffic_density()),
            );
            properties.insert("score".to_string(), JsonValue::from(cell.score));
            if let Some(distance) = cell.nearest_facility_distance {
                properties.insert(
                    "nearest_facility_distance".to_string(),
                    JsonValue::from(distance),
                );
            }
            feature(polygon_value(&cell.aggregate.cell.polygon()), properties)
        })
        .collect();

    collection(features)
}

/// One point feature per candidate, with its 1-based rank.
pub fn candidates_to_geojson(candidates: &[Candidate]) -> FeatureCollection {
    let features = candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let mut properties = JsonObject::new();
            properties.insert("rank".to_string(), JsonValue::from(idx + 1));
            properties.insert("cell_id".to_string(), JsonValue::from(candidate.cell_id.0));
            properties.insert("score".to_string(), JsonValue::from(candidate.score));
            properties.insert(
                "total_traffic".to_string(),
                JsonValue::from(candidate.total_traffic),
            );
            feature(
                Value::Point(vec![candidate.centroid.x(), candidate.centroid.y()]),
                properties,
            )
        })
        .collect();

    collection(features)
}

/// Serialise a feature collection.
pub fn to_string(collection: &FeatureCollection) -> Result<String> {
    Ok(serde_json::to_string(collection)?)
}
