// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! GeoJSON construction and access helpers

use geo::Point;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde_json::Value;

/// An empty feature collection
pub fn empty_collection() -> FeatureCollection {
    collection(Vec::new())
}

/// Wrap features into a collection without a bounding box
pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// A feature with the given geometry and no properties
pub fn feature(value: GeoValue) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: None,
        foreign_members: None,
    }
}

pub fn point_feature(point: Point) -> Feature {
    feature(GeoValue::Point(position(point)))
}

pub fn line_feature(points: &[Point]) -> Feature {
    feature(GeoValue::LineString(
        points.iter().copied().map(position).collect(),
    ))
}

/// A single-ring polygon. The ring is closed if the caller did not close it.
pub fn polygon_feature(points: &[Point]) -> Feature {
    let mut ring: Vec<Vec<f64>> = points.iter().copied().map(position).collect();
    if let Some(first) = ring.first().cloned()
        && ring.last() != Some(&first)
    {
        ring.push(first);
    }
    feature(GeoValue::Polygon(vec![ring]))
}

/// Set a property, creating the property object if needed
pub fn with_property(mut feature: Feature, key: &str, value: impl Into<Value>) -> Feature {
    feature
        .properties
        .get_or_insert_with(JsonObject::new)
        .insert(key.to_string(), value.into());
    feature
}

/// Look up a property value by name
pub fn property<'a>(feature: &'a Feature, name: &str) -> Option<&'a Value> {
    feature.properties.as_ref().and_then(|props| props.get(name))
}

/// GeoJSON position for a geographic point
pub fn position(point: Point) -> Vec<f64> {
    vec![point.x(), point.y()]
}

/// Geographic point from a GeoJSON position, ignoring altitude
pub fn to_point(position: &[f64]) -> Option<Point> {
    match position {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(Point::new(*lon, *lat)),
        _ => None,
    }
}

/// Every position of a geometry, flattened
pub fn positions(value: &GeoValue) -> Vec<Point> {
    let mut out = Vec::new();
    collect_positions(value, &mut out);
    out
}

fn collect_positions(value: &GeoValue, out: &mut Vec<Point>) {
    match value {
        GeoValue::Point(p) => out.extend(to_point(p)),
        GeoValue::MultiPoint(ps) | GeoValue::LineString(ps) => {
            out.extend(ps.iter().filter_map(|p| to_point(p)));
        }
        GeoValue::MultiLineString(lines) | GeoValue::Polygon(lines) => {
            out.extend(lines.iter().flatten().filter_map(|p| to_point(p)));
        }
        GeoValue::MultiPolygon(polygons) => {
            out.extend(
                polygons
                    .iter()
                    .flatten()
                    .flatten()
                    .filter_map(|p| to_point(p)),
            );
        }
        GeoValue::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_positions(&geometry.value, out);
            }
        }
    }
}
