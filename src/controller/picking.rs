// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Object picking.
//!
//! The [`PickingEngine`] trait is the boundary with the rendering engine:
//! given a canvas pixel and a tolerance, report the drawn features under
//! it. [`HitTester`] is a software engine that tests directly against the
//! last synced drawables, so the map works headless and in tests.

use geojson::{Feature, Value as GeoValue};
use kurbo::{BezPath, Line, ParamCurveNearest, Point, Shape};

use super::viewport::Viewport;
use crate::layers::{DrawableKind, DrawableLayer, ResolvedStyle};
use crate::model::features;

/// Accuracy used when measuring distance to line segments
const NEAREST_ACCURACY: f64 = 1e-6;

/// A feature found under the cursor
#[derive(Debug, Clone)]
pub struct PickedObject {
    /// Store layer the feature belongs to
    pub layer_id: String,
    pub feature: Feature,
    /// Where the pick happened (canvas pixels)
    pub pixel: Point,
    /// The geographic position of `pixel`
    pub coordinate: geo::Point,
}

/// Capability of the rendering engine to report what is drawn where
pub trait PickingEngine {
    /// The topmost object within `radius` pixels of `point`
    fn pick_object(&self, point: Point, radius: f64) -> Option<PickedObject>;

    /// Every object within `radius` pixels of `point`, topmost layer first.
    /// An empty `layer_ids` means all layers.
    fn pick_multiple(&self, point: Point, radius: f64, layer_ids: &[String]) -> Vec<PickedObject>;

    /// Take the drawables of the latest frame
    fn sync(&mut self, layers: &[DrawableLayer], viewport: &Viewport);
}

/// Software picking against drawn geometry
#[derive(Debug, Default)]
pub struct HitTester {
    layers: Vec<DrawableLayer>,
    viewport: Viewport,
}

impl HitTester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hits for one point, walking layers from the top of the draw order
    fn hits(&self, point: Point, radius: f64, layer_ids: &[String]) -> Vec<(f64, PickedObject)> {
        let coordinate = self.viewport.to_geo(point);
        let mut out = Vec::new();

        for layer in self.layers.iter().rev().filter(|l| l.pickable) {
            if !layer_ids.is_empty() && !layer_ids.contains(&layer.source) {
                continue;
            }
            for (feature, style) in layer.drawn() {
                let Some(distance) = self.distance(layer.kind, feature, style, point) else {
                    continue;
                };
                if distance <= radius {
                    out.push((
                        distance,
                        PickedObject {
                            layer_id: layer.source.clone(),
                            feature: feature.clone(),
                            pixel: point,
                            coordinate,
                        },
                    ));
                }
            }
        }

        tracing::debug!(
            "[hits] point=({:.1}, {:.1}), radius={}, found {}",
            point.x,
            point.y,
            radius,
            out.len()
        );
        out
    }

    /// Screen distance from `point` to the drawn feature, 0 when inside
    fn distance(
        &self,
        kind: DrawableKind,
        feature: &Feature,
        style: &ResolvedStyle,
        point: Point,
    ) -> Option<f64> {
        let geometry = &feature.geometry.as_ref()?.value;
        match kind {
            DrawableKind::Circle | DrawableKind::Text => {
                let reach = style.radius + style.width / 2.0;
                features::positions(geometry)
                    .into_iter()
                    .map(|p| ((self.viewport.to_screen(p) - point).hypot() - reach).max(0.0))
                    .min_by(f64::total_cmp)
            }
            DrawableKind::Line | DrawableKind::ArrowPath { .. } => self
                .segments(geometry)
                .map(|seg| {
                    let nearest = seg.nearest(point, NEAREST_ACCURACY);
                    (nearest.distance_sq.sqrt() - style.width / 2.0).max(0.0)
                })
                .min_by(f64::total_cmp),
            DrawableKind::Fill => {
                if self.polygon_paths(geometry).any(|path| path.winding(point) != 0) {
                    Some(0.0)
                } else {
                    None
                }
            }
        }
    }

    fn segments(&self, geometry: &GeoValue) -> impl Iterator<Item = Line> {
        let lines: Vec<Vec<Point>> = match geometry {
            GeoValue::LineString(ps) => vec![self.screen_ring(ps)],
            GeoValue::MultiLineString(lines) | GeoValue::Polygon(lines) => {
                lines.iter().map(|ps| self.screen_ring(ps)).collect()
            }
            _ => Vec::new(),
        };
        lines
            .into_iter()
            .flat_map(|ps| ps.windows(2).map(|w| Line::new(w[0], w[1])).collect::<Vec<_>>())
    }

    fn polygon_paths(&self, geometry: &GeoValue) -> impl Iterator<Item = BezPath> {
        let polygons: Vec<&Vec<Vec<Vec<f64>>>> = match geometry {
            GeoValue::Polygon(rings) => vec![rings],
            GeoValue::MultiPolygon(polygons) => polygons.iter().collect(),
            _ => Vec::new(),
        };
        polygons
            .into_iter()
            .map(|rings| {
                // Holes wind the other way in GeoJSON, so they cancel out
                let mut path = BezPath::new();
                for ring in rings {
                    let points = self.screen_ring(ring);
                    let Some((first, rest)) = points.split_first() else {
                        continue;
                    };
                    path.move_to(*first);
                    for p in rest {
                        path.line_to(*p);
                    }
                    path.close_path();
                }
                path
            })
    }

    fn screen_ring(&self, positions: &[Vec<f64>]) -> Vec<Point> {
        positions
            .iter()
            .filter_map(|p| features::to_point(p))
            .map(|p| self.viewport.to_screen(p))
            .collect()
    }
}

impl PickingEngine for HitTester {
    fn pick_object(&self, point: Point, radius: f64) -> Option<PickedObject> {
        // Topmost layer wins; within a layer the closest feature wins
        let hits = self.hits(point, radius, &[]);
        let top = hits.first()?.1.layer_id.clone();
        hits.into_iter()
            .filter(|(_, hit)| hit.layer_id == top)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, hit)| hit)
    }

    fn pick_multiple(&self, point: Point, radius: f64, layer_ids: &[String]) -> Vec<PickedObject> {
        self.hits(point, radius, layer_ids)
            .into_iter()
            .map(|(_, hit)| hit)
            .collect()
    }

    fn sync(&mut self, layers: &[DrawableLayer], viewport: &Viewport) {
        self.layers = layers.to_vec();
        self.viewport = *viewport;
    }
}

/// Group picked objects by layer, keeping first-seen layer order
pub fn group_by_layer(objects: Vec<PickedObject>) -> Vec<(String, Vec<PickedObject>)> {
    let mut groups: Vec<(String, Vec<PickedObject>)> = Vec::new();
    for object in objects {
        match groups.iter_mut().find(|(id, _)| *id == object.layer_id) {
            Some((_, list)) => list.push(object),
            None => groups.push((object.layer_id.clone(), vec![object])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::render::{RenderContext, render};
    use crate::layers::style::{CircleStyle, FillStyle, LineStyle};
    use crate::layers::{LayerDescriptor, LayerStyle, Revision};
    use crate::model::features::{collection, line_feature, point_feature, polygon_feature};
    use geojson::FeatureCollection;
    use kurbo::Size;
    use std::rc::Rc;

    fn viewport() -> Viewport {
        Viewport::new(geo::Point::new(0.0, 0.0), 10.0, Size::new(800.0, 600.0))
    }

    fn drawable(id: &str, style: LayerStyle, data: FeatureCollection) -> DrawableLayer {
        let d = LayerDescriptor {
            id: id.to_string(),
            visible: true,
            style: Rc::new(style),
            data: Rc::new(data),
        };
        let ctx = RenderContext {
            zoom: 10.0,
            animations_enabled: false,
        };
        render(&d, Revision::default(), None, &ctx, &[])
            .pop()
            .unwrap()
    }

    fn tester(layers: Vec<DrawableLayer>) -> (HitTester, Viewport) {
        let vp = viewport();
        let mut tester = HitTester::new();
        tester.sync(&layers, &vp);
        (tester, vp)
    }

    #[test]
    fn picks_point_within_radius() {
        let node = geo::Point::new(0.01, 0.01);
        let layer = drawable(
            "transitNodes",
            LayerStyle::Circle(CircleStyle::default()),
            collection(vec![point_feature(node)]),
        );
        let (tester, vp) = tester(vec![layer]);
        let at = vp.to_screen(node);

        let hit = tester.pick_object(at + kurbo::Vec2::new(7.0, 0.0), 4.0);
        assert_eq!(hit.map(|h| h.layer_id), Some("transitNodes".to_string()));
        // Radius 5 + half stroke 0.5 + tolerance 4 = 9.5
        assert!(tester.pick_object(at + kurbo::Vec2::new(10.0, 0.0), 4.0).is_none());
    }

    #[test]
    fn picks_line_near_segment() {
        let a = geo::Point::new(-0.02, 0.0);
        let b = geo::Point::new(0.02, 0.0);
        let layer = drawable(
            "transitPaths",
            LayerStyle::Line(LineStyle::default()),
            collection(vec![line_feature(&[a, b])]),
        );
        let (tester, vp) = tester(vec![layer]);
        let mid = vp.to_screen(geo::Point::new(0.0, 0.0));
        assert!(tester.pick_object(mid + kurbo::Vec2::new(0.0, 5.0), 4.0).is_some());
        assert!(tester.pick_object(mid + kurbo::Vec2::new(0.0, 6.0), 4.0).is_none());
    }

    #[test]
    fn picks_inside_polygon() {
        let square = [
            geo::Point::new(-0.01, -0.01),
            geo::Point::new(0.01, -0.01),
            geo::Point::new(0.01, 0.01),
            geo::Point::new(-0.01, 0.01),
        ];
        let layer = drawable(
            "isochronePolygons",
            LayerStyle::Fill(FillStyle::default()),
            collection(vec![polygon_feature(&square)]),
        );
        let (tester, vp) = tester(vec![layer]);
        assert!(tester.pick_object(vp.to_screen(geo::Point::new(0.0, 0.0)), 4.0).is_some());
        assert!(tester.pick_object(vp.to_screen(geo::Point::new(0.05, 0.0)), 4.0).is_none());
    }

    #[test]
    fn topmost_layer_first_and_unpickable_skipped() {
        let node = geo::Point::new(0.0, 0.0);
        let bottom = drawable(
            "transitStations",
            LayerStyle::Circle(CircleStyle::default()),
            collection(vec![point_feature(node)]),
        );
        let top = drawable(
            "transitNodes",
            LayerStyle::Circle(CircleStyle::default()),
            collection(vec![point_feature(node)]),
        );
        let mut hidden = top.clone();
        hidden.id = "overlay".into();
        hidden.source = "overlay".into();
        hidden.pickable = false;

        let (tester, vp) = tester(vec![bottom, top, hidden]);
        let at = vp.to_screen(node);

        let hit = tester.pick_object(at, 4.0).unwrap();
        assert_eq!(hit.layer_id, "transitNodes");

        let all: Vec<_> = tester
            .pick_multiple(at, 4.0, &[])
            .into_iter()
            .map(|h| h.layer_id)
            .collect();
        assert_eq!(all, ["transitNodes", "transitStations"]);

        let only = tester.pick_multiple(at, 4.0, &["transitStations".to_string()]);
        assert_eq!(only.len(), 1);
    }

    #[test]
    fn grouping_keeps_layer_order() {
        let object = |layer: &str| PickedObject {
            layer_id: layer.to_string(),
            feature: point_feature(geo::Point::new(0.0, 0.0)),
            pixel: Point::ZERO,
            coordinate: geo::Point::new(0.0, 0.0),
        };
        let groups = group_by_layer(vec![object("b"), object("a"), object("b")]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "a");
    }
}
