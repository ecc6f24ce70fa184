// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Safe bounding boxes for fitting the view to layer data.
//!
//! Empty collections have no extent and yield `None`. Degenerate boxes (a
//! single stop, a perfectly vertical path) are widened around their middle
//! to `settings::bounds::MIN_DELTA` degrees, then clamped to valid
//! longitude and latitude.

use geo::{BoundingRect, Coord, Intersects, MultiPoint, Rect};
use geojson::FeatureCollection;

use crate::model::features;
use crate::settings;

/// Bounding box of every position in the collection, widened and clamped
pub fn safe_bounds(data: &FeatureCollection) -> Option<Rect> {
    let points: Vec<geo::Point> = data
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .flat_map(|g| features::positions(&g.value))
        .collect();
    let rect = MultiPoint::from(points).bounding_rect()?;

    let (min_x, max_x) = widen(rect.min().x, rect.max().x);
    let (min_y, max_y) = widen(rect.min().y, rect.max().y);

    Some(Rect::new(
        Coord {
            x: min_x.clamp(-180.0, 180.0),
            y: min_y.clamp(-90.0, 90.0),
        },
        Coord {
            x: max_x.clamp(-180.0, 180.0),
            y: max_y.clamp(-90.0, 90.0),
        },
    ))
}

fn widen(min: f64, max: f64) -> (f64, f64) {
    let delta = settings::bounds::MIN_DELTA;
    if max - min < delta {
        let mid = (min + max) / 2.0;
        (mid - delta / 2.0, mid + delta / 2.0)
    } else {
        (min, max)
    }
}

/// Shrink a rect by `ratio` of its size on every side (ratio capped at 0.49)
pub fn inset(rect: Rect, ratio: f64) -> Rect {
    let ratio = ratio.clamp(0.0, 0.49);
    let dx = rect.width() * ratio;
    let dy = rect.height() * ratio;
    Rect::new(
        Coord {
            x: rect.min().x + dx,
            y: rect.min().y + dy,
        },
        Coord {
            x: rect.max().x - dx,
            y: rect.max().y - dy,
        },
    )
}

/// Whether any actual geometry of the collection touches `area`.
///
/// Tests the real shapes rather than their bounding box, so a C-shaped path
/// around the area does not count as visible. Features without geometry
/// never intersect.
pub fn intersects(data: &FeatureCollection, area: Rect) -> bool {
    data.features
        .iter()
        .filter_map(|f| f.geometry.clone())
        .filter_map(|g| geo::Geometry::<f64>::try_from(g).ok())
        .any(|g| g.intersects(&area))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::features::{collection, line_feature, point_feature};
    use geo::Point;

    #[test]
    fn empty_collection_has_no_bounds() {
        assert!(safe_bounds(&collection(vec![])).is_none());
    }

    #[test]
    fn single_point_is_widened() {
        let data = collection(vec![point_feature(Point::new(-73.5, 45.5))]);
        let rect = safe_bounds(&data).unwrap();
        assert!((rect.width() - 0.001).abs() < 1e-9);
        assert!((rect.height() - 0.001).abs() < 1e-9);
        assert!((rect.center().x + 73.5).abs() < 1e-9);
    }

    #[test]
    fn bounds_are_clamped_to_valid_range() {
        let data = collection(vec![point_feature(Point::new(180.0, 90.0))]);
        let rect = safe_bounds(&data).unwrap();
        assert!(rect.max().x <= 180.0);
        assert!(rect.max().y <= 90.0);
    }

    #[test]
    fn line_bounds_cover_all_vertices() {
        let data = collection(vec![line_feature(&[
            Point::new(-74.0, 45.0),
            Point::new(-73.0, 46.0),
        ])]);
        let rect = safe_bounds(&data).unwrap();
        assert_eq!(rect.min(), Coord { x: -74.0, y: 45.0 });
        assert_eq!(rect.max(), Coord { x: -73.0, y: 46.0 });
    }

    #[test]
    fn concave_path_around_area_does_not_intersect() {
        // A "C" around the unit square centered at (5, 5)
        let data = collection(vec![line_feature(&[
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        ])]);
        let area = Rect::new(Coord { x: 4.0, y: 4.0 }, Coord { x: 6.0, y: 6.0 });
        assert!(!intersects(&data, area));
        let crossing = Rect::new(Coord { x: -1.0, y: 4.0 }, Coord { x: 1.0, y: 6.0 });
        assert!(intersects(&data, crossing));
    }

    #[test]
    fn inset_shrinks_each_side() {
        let rect = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 20.0 });
        let inner = inset(rect, 0.1);
        assert_eq!(inner.min(), Coord { x: 1.0, y: 2.0 });
        assert_eq!(inner.max(), Coord { x: 9.0, y: 18.0 });
    }
}
