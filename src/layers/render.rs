// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Conversion of layer descriptors into drawable layers.
//!
//! [`render`] is pure: given a descriptor, its revision, its filter and the
//! current zoom it produces the drawables the engine should show, with
//! every style channel resolved per feature. The revision is passed through
//! untouched as the drawable's cache key, so the engine can reuse GPU
//! buffers until the layer's data, filter or visibility changes.

use std::rc::Rc;

use geojson::{Feature, FeatureCollection};
use peniko::Color;

use super::store::FeatureFilter;
use super::style::{Channel, LayerCommon, LayerStyle, LineStyle, node_radius_for_zoom};
use super::{LayerDescriptor, Revision};
use crate::events::MapEventName;
use crate::theme;

/// Extra contour width drawn around animated paths (pixels)
const CONTOUR_EXTRA_WIDTH: f64 = 2.0;

/// View state a render depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub zoom: f64,
    pub animations_enabled: bool,
}

/// Style values for one feature after channel resolution
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    /// Fill for circles and polygons, stroke for lines, glyph color for text
    pub color: Color,
    /// Circle outline or polygon outline
    pub stroke_color: Option<Color>,
    /// Circle radius (pixels)
    pub radius: f64,
    /// Line width, or outline width for circles and polygons (pixels)
    pub width: f64,
    pub label: Option<String>,
}

/// A feature selected for drawing, by index into the layer data
#[derive(Debug, Clone)]
pub struct DrawFeature {
    pub index: usize,
    pub style: ResolvedStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawableKind {
    Circle,
    Line,
    Fill,
    /// Path with direction arrows, moving when `animated`
    ArrowPath { animated: bool },
    Text,
}

/// One engine layer
#[derive(Debug, Clone)]
pub struct DrawableLayer {
    /// Engine layer id, unique per frame
    pub id: String,
    /// The store layer the drawable was built from
    pub source: String,
    pub kind: DrawableKind,
    pub data: Rc<FeatureCollection>,
    pub features: Vec<DrawFeature>,
    pub cache_key: Revision,
    pub pickable: bool,
    pub opacity: f64,
    /// Events bound to the source layer; empty while an edit tool is active
    pub events: Vec<MapEventName>,
}

impl DrawableLayer {
    /// Iterate the drawn features with their resolved style
    pub fn drawn(&self) -> impl Iterator<Item = (&Feature, &ResolvedStyle)> {
        self.features
            .iter()
            .filter_map(|d| self.data.features.get(d.index).map(|f| (f, &d.style)))
    }
}

/// Build the drawables for one layer.
///
/// Returns nothing when the layer is hidden or the zoom lies outside
/// `[min_zoom, max_zoom)`. Features rejected by `filter`, or whose own
/// minimum zoom is above `floor(zoom)`, are skipped.
pub fn render(
    descriptor: &LayerDescriptor,
    revision: Revision,
    filter: Option<&FeatureFilter>,
    ctx: &RenderContext,
    events: &[MapEventName],
) -> Vec<DrawableLayer> {
    let style = descriptor.style.as_ref();
    if !descriptor.visible || !style.visible_at(ctx.zoom) {
        return Vec::new();
    }

    let common = style.common();
    let features: Vec<DrawFeature> = descriptor
        .data
        .features
        .iter()
        .enumerate()
        .filter(|(_, f)| filter.is_none_or(|keep| keep(*f)))
        .filter(|(_, f)| shown_at_zoom(common, f, ctx.zoom))
        .map(|(index, f)| DrawFeature {
            index,
            style: resolve(style, f, ctx.zoom),
        })
        .collect();

    let base = DrawableLayer {
        id: descriptor.id.clone(),
        source: descriptor.id.clone(),
        kind: kind_of(style, ctx),
        data: Rc::clone(&descriptor.data),
        features,
        cache_key: revision,
        pickable: common.pickable,
        opacity: common.opacity,
        events: events.to_vec(),
    };

    match style {
        LayerStyle::AnimatedPath(path) if path.stroked => {
            vec![contour(&base, &path.line), base]
        }
        _ => vec![base],
    }
}

fn kind_of(style: &LayerStyle, ctx: &RenderContext) -> DrawableKind {
    match style {
        LayerStyle::Circle(_) => DrawableKind::Circle,
        LayerStyle::Line(_) => DrawableKind::Line,
        LayerStyle::Fill(_) => DrawableKind::Fill,
        LayerStyle::AnimatedPath(_) => DrawableKind::ArrowPath {
            animated: ctx.animations_enabled,
        },
        LayerStyle::Text(_) => DrawableKind::Text,
    }
}

/// Lower thresholds win: a feature shows once floor(zoom) reaches it
fn shown_at_zoom(common: &LayerCommon, feature: &Feature, zoom: f64) -> bool {
    common
        .feature_min_zoom
        .as_ref()
        .is_none_or(|threshold| threshold.resolve(feature) <= zoom.floor())
}

fn resolve(style: &LayerStyle, feature: &Feature, zoom: f64) -> ResolvedStyle {
    match style {
        LayerStyle::Circle(s) => {
            let radius = if s.scale_with_zoom {
                node_radius_for_zoom(zoom)
            } else {
                s.radius.resolve(feature)
            };
            ResolvedStyle {
                color: s.color.resolve(feature),
                stroke_color: s.stroke_color.as_ref().map(|c| c.resolve(feature)),
                radius: clamp_pixels(radius, s.radius_min_pixels, s.radius_max_pixels),
                width: s.stroke_width.resolve(feature),
                label: None,
            }
        }
        LayerStyle::Line(s) => resolve_line(s, feature),
        LayerStyle::AnimatedPath(s) => resolve_line(&s.line, feature),
        LayerStyle::Fill(s) => {
            let color = s.color.resolve(feature);
            ResolvedStyle {
                color,
                stroke_color: Some(resolve_or(s.line_color.as_ref(), feature, color)),
                radius: 0.0,
                width: s.line_width.resolve(feature),
                label: None,
            }
        }
        LayerStyle::Text(s) => ResolvedStyle {
            color: s.color.resolve(feature),
            stroke_color: None,
            radius: 0.0,
            width: s.size.resolve(feature),
            label: Some(s.text.resolve(feature)).filter(|t| !t.is_empty()),
        },
    }
}

fn resolve_line(s: &LineStyle, feature: &Feature) -> ResolvedStyle {
    ResolvedStyle {
        color: s.color.resolve(feature),
        stroke_color: None,
        radius: 0.0,
        width: clamp_pixels(
            s.width.resolve(feature),
            s.width_min_pixels,
            s.width_max_pixels,
        ),
        label: None,
    }
}

fn resolve_or(channel: Option<&Channel<Color>>, feature: &Feature, fallback: Color) -> Color {
    channel.map_or(fallback, |c| c.resolve(feature))
}

fn clamp_pixels(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let value = min.map_or(value, |min| value.max(min));
    max.map_or(value, |max| value.min(max))
}

/// White stroke under an animated path, one contour per drawn feature
fn contour(base: &DrawableLayer, line: &LineStyle) -> DrawableLayer {
    let features = base
        .features
        .iter()
        .map(|d| DrawFeature {
            index: d.index,
            style: ResolvedStyle {
                color: theme::layer::CONTOUR,
                stroke_color: None,
                radius: 0.0,
                width: clamp_pixels(
                    d.style.width + CONTOUR_EXTRA_WIDTH,
                    line.width_min_pixels.map(|w| w + CONTOUR_EXTRA_WIDTH),
                    line.width_max_pixels.map(|w| w + CONTOUR_EXTRA_WIDTH),
                ),
                label: None,
            },
        })
        .collect();

    DrawableLayer {
        id: format!("{}-contour", base.source),
        source: base.source.clone(),
        kind: DrawableKind::Line,
        data: Rc::clone(&base.data),
        features,
        cache_key: base.cache_key,
        pickable: false,
        opacity: base.opacity,
        events: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::style::{AnimatedPathStyle, CircleStyle, TextStyle};
    use crate::model::features::{collection, line_feature, point_feature, with_property};
    use geo::Point;

    const CTX: RenderContext = RenderContext {
        zoom: 14.5,
        animations_enabled: true,
    };

    fn stops() -> Rc<FeatureCollection> {
        let stop = |x: f64, min_zoom: f64, color: &str| {
            let f = point_feature(Point::new(x, 45.0));
            let f = with_property(f, "min_zoom", min_zoom);
            with_property(f, "color", color)
        };
        Rc::new(collection(vec![
            stop(0.0, 10.0, "#ff0000"),
            stop(1.0, 14.0, "#00ff00"),
            stop(2.0, 15.0, "#0000ff"),
        ]))
    }

    fn descriptor(style: LayerStyle, data: Rc<FeatureCollection>) -> LayerDescriptor {
        LayerDescriptor {
            id: "transitNodes".to_string(),
            visible: true,
            style: Rc::new(style),
            data,
        }
    }

    fn circle() -> LayerStyle {
        LayerStyle::Circle(CircleStyle {
            color: Channel::property("color", theme::layer::DEFAULT),
            ..CircleStyle::default()
        })
    }

    #[test]
    fn revision_is_the_cache_key() {
        let d = descriptor(circle(), stops());
        let rev = Revision::default().next().next();
        let out = render(&d, rev, None, &CTX, &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cache_key, rev);
    }

    #[test]
    fn whole_layer_culled_outside_zoom_range() {
        let style = LayerStyle::Circle(CircleStyle {
            common: LayerCommon {
                min_zoom: Some(15.0),
                ..LayerCommon::default()
            },
            ..CircleStyle::default()
        });
        let d = descriptor(style, stops());
        assert!(render(&d, Revision::default(), None, &CTX, &[]).is_empty());

        let at_min = RenderContext { zoom: 15.0, ..CTX };
        assert_eq!(render(&d, Revision::default(), None, &at_min, &[]).len(), 1);
    }

    #[test]
    fn features_culled_by_their_own_min_zoom() {
        let style = LayerStyle::Circle(CircleStyle {
            common: LayerCommon {
                feature_min_zoom: Some(Channel::property("min_zoom", 0.0)),
                ..LayerCommon::default()
            },
            ..CircleStyle::default()
        });
        let d = descriptor(style, stops());
        let out = render(&d, Revision::default(), None, &CTX, &[]);
        let indices: Vec<_> = out[0].features.iter().map(|f| f.index).collect();
        // floor(14.5) = 14 shows the 10 and 14 thresholds, not 15
        assert_eq!(indices, [0, 1]);
    }

    #[test]
    fn filter_removes_features() {
        let d = descriptor(circle(), stops());
        let only_first: FeatureFilter = Rc::new(|f: &Feature| {
            crate::model::features::property(f, "color").and_then(|v| v.as_str())
                == Some("#ff0000")
        });
        let out = render(&d, Revision::default(), Some(&only_first), &CTX, &[]);
        assert_eq!(out[0].features.len(), 1);
    }

    #[test]
    fn channels_resolved_per_feature() {
        let d = descriptor(circle(), stops());
        let out = render(&d, Revision::default(), None, &CTX, &[]);
        let greens: Vec<_> = out[0]
            .drawn()
            .map(|(_, s)| s.color.to_rgba8().g)
            .collect();
        assert_eq!(greens, [0, 0xff, 0]);
    }

    #[test]
    fn hidden_layer_renders_nothing() {
        let mut d = descriptor(circle(), stops());
        d.visible = false;
        assert!(render(&d, Revision::default(), None, &CTX, &[]).is_empty());
    }

    #[test]
    fn render_does_not_mutate_input() {
        let data = stops();
        let d = descriptor(circle(), Rc::clone(&data));
        let before = serde_json::to_string(&*data).unwrap();
        let _ = render(&d, Revision::default(), None, &CTX, &[]);
        assert_eq!(serde_json::to_string(&*data).unwrap(), before);
    }

    #[test]
    fn stroked_animated_path_adds_contour_below() {
        let path = line_feature(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        let style = LayerStyle::AnimatedPath(AnimatedPathStyle {
            line: LineStyle {
                width: Channel::constant(6.0),
                ..LineStyle::default()
            },
            stroked: true,
        });
        let mut d = descriptor(style, Rc::new(collection(vec![path])));
        d.id = "routingPaths".to_string();

        let out = render(&d, Revision::default(), None, &CTX, &[MapEventName::LeftClick]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "routingPaths-contour");
        assert!(!out[0].pickable);
        assert!(out[0].events.is_empty());
        assert_eq!(out[0].features[0].style.width, 8.0);
        assert_eq!(out[1].kind, DrawableKind::ArrowPath { animated: true });
        assert_eq!(out[1].events, [MapEventName::LeftClick]);

        let still = RenderContext {
            animations_enabled: false,
            ..CTX
        };
        let out = render(&d, Revision::default(), None, &still, &[]);
        assert_eq!(out[1].kind, DrawableKind::ArrowPath { animated: false });
    }

    #[test]
    fn empty_text_gives_no_label() {
        let style = LayerStyle::Text(TextStyle::default());
        let labelled = with_property(point_feature(Point::new(0.0, 0.0)), "label", "120 m");
        let blank = point_feature(Point::new(1.0, 0.0));
        let d = descriptor(style, Rc::new(collection(vec![labelled, blank])));
        let out = render(&d, Revision::default(), None, &CTX, &[]);
        let labels: Vec<_> = out[0].drawn().map(|(_, s)| s.label.clone()).collect();
        assert_eq!(labels, [Some("120 m".to_string()), None]);
    }

    #[test]
    fn radius_clamped_to_pixel_bounds() {
        let style = LayerStyle::Circle(CircleStyle {
            radius: Channel::constant(80.0),
            radius_max_pixels: Some(50.0),
            ..CircleStyle::default()
        });
        let d = descriptor(style, stops());
        let out = render(&d, Revision::default(), None, &CTX, &[]);
        assert!(out[0].features.iter().all(|f| f.style.radius == 50.0));
    }
}
