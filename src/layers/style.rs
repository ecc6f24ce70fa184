// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Layer styles and per-feature style channels.
//!
//! A style is a tagged enum over the kinds of layer the map can draw. Each
//! visual property is a [`Channel`]: a constant, a lookup of a feature
//! property with a fallback, or an arbitrary function of the feature.
//! Channels are resolved when the layer is rendered and never fail: a
//! missing or malformed property resolves to the channel default.

use std::fmt;
use std::rc::Rc;

use geojson::Feature;
use peniko::Color;
use serde_json::Value;

use crate::layers::color;
use crate::model::features;
use crate::theme;

// ===== Channel =====

/// Per-feature function channel
pub type FeatureFn<T> = Rc<dyn Fn(&Feature) -> T>;

/// A style property that may vary per feature
pub enum Channel<T> {
    /// Same value for every feature
    Constant(T),
    /// Read from the named feature property, `default` if missing or invalid
    Property { name: String, default: T },
    /// Computed from the feature
    Function(FeatureFn<T>),
}

/// Conversion from a raw feature property value
pub trait FromProperty: Sized {
    fn from_property(value: &Value) -> Option<Self>;
}

impl FromProperty for f64 {
    fn from_property(value: &Value) -> Option<Self> {
        value.as_f64().filter(|v| v.is_finite())
    }
}

impl FromProperty for Color {
    fn from_property(value: &Value) -> Option<Self> {
        color::from_json(value)
    }
}

impl FromProperty for String {
    fn from_property(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl<T: Clone + FromProperty> Channel<T> {
    pub fn constant(value: T) -> Self {
        Channel::Constant(value)
    }

    pub fn property(name: impl Into<String>, default: T) -> Self {
        Channel::Property {
            name: name.into(),
            default,
        }
    }

    pub fn function(f: impl Fn(&Feature) -> T + 'static) -> Self {
        Channel::Function(Rc::new(f))
    }

    /// Resolve the channel for one feature
    pub fn resolve(&self, feature: &Feature) -> T {
        match self {
            Channel::Constant(value) => value.clone(),
            Channel::Property { name, default } => features::property(feature, name)
                .and_then(T::from_property)
                .unwrap_or_else(|| default.clone()),
            Channel::Function(f) => f(feature),
        }
    }
}

impl<T: Clone> Clone for Channel<T> {
    fn clone(&self) -> Self {
        match self {
            Channel::Constant(v) => Channel::Constant(v.clone()),
            Channel::Property { name, default } => Channel::Property {
                name: name.clone(),
                default: default.clone(),
            },
            Channel::Function(f) => Channel::Function(Rc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Channel::Property { name, default } => f
                .debug_struct("Property")
                .field("name", name)
                .field("default", default)
                .finish(),
            Channel::Function(_) => f.write_str("Function(..)"),
        }
    }
}

// ===== Layer Styles =====

/// Settings shared by every kind of layer
#[derive(Debug, Clone)]
pub struct LayerCommon {
    /// Layer opacity, 0.0 to 1.0
    pub opacity: f64,
    /// The layer is drawn when zoom >= min_zoom
    pub min_zoom: Option<f64>,
    /// The layer is drawn when zoom < max_zoom
    pub max_zoom: Option<f64>,
    /// Per-feature minimum zoom; a feature is drawn once floor(zoom)
    /// reaches its threshold
    pub feature_min_zoom: Option<Channel<f64>>,
    pub pickable: bool,
}

impl Default for LayerCommon {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            min_zoom: None,
            max_zoom: None,
            feature_min_zoom: None,
            pickable: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircleStyle {
    pub common: LayerCommon,
    pub color: Channel<Color>,
    pub radius: Channel<f64>,
    pub stroke_color: Option<Channel<Color>>,
    pub stroke_width: Channel<f64>,
    pub radius_min_pixels: Option<f64>,
    pub radius_max_pixels: Option<f64>,
    /// Ignore `radius` and grow the circle with the zoom level
    pub scale_with_zoom: bool,
}

impl Default for CircleStyle {
    fn default() -> Self {
        Self {
            common: LayerCommon::default(),
            color: Channel::Constant(theme::layer::DEFAULT),
            radius: Channel::Constant(5.0),
            stroke_color: None,
            stroke_width: Channel::Constant(1.0),
            radius_min_pixels: None,
            radius_max_pixels: None,
            scale_with_zoom: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LineStyle {
    pub common: LayerCommon,
    pub color: Channel<Color>,
    pub width: Channel<f64>,
    pub width_min_pixels: Option<f64>,
    pub width_max_pixels: Option<f64>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            common: LayerCommon::default(),
            color: Channel::Constant(theme::layer::DEFAULT),
            width: Channel::Constant(3.0),
            width_min_pixels: None,
            width_max_pixels: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FillStyle {
    pub common: LayerCommon,
    pub color: Channel<Color>,
    pub line_color: Option<Channel<Color>>,
    pub line_width: Channel<f64>,
}

impl Default for FillStyle {
    fn default() -> Self {
        Self {
            common: LayerCommon::default(),
            color: Channel::Constant(theme::layer::DEFAULT),
            line_color: None,
            line_width: Channel::Constant(1.0),
        }
    }
}

/// A path drawn with moving direction arrows
#[derive(Debug, Clone, Default)]
pub struct AnimatedPathStyle {
    pub line: LineStyle,
    /// Draw a white contour under the path
    pub stroked: bool,
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub common: LayerCommon,
    pub color: Channel<Color>,
    pub text: Channel<String>,
    pub size: Channel<f64>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            common: LayerCommon::default(),
            color: Channel::Constant(theme::layer::DEFAULT),
            text: Channel::Property {
                name: "label".to_string(),
                default: String::new(),
            },
            size: Channel::Constant(12.0),
        }
    }
}

/// How a layer is drawn
#[derive(Debug, Clone)]
pub enum LayerStyle {
    Circle(CircleStyle),
    Line(LineStyle),
    Fill(FillStyle),
    AnimatedPath(AnimatedPathStyle),
    Text(TextStyle),
}

impl LayerStyle {
    pub fn common(&self) -> &LayerCommon {
        match self {
            LayerStyle::Circle(s) => &s.common,
            LayerStyle::Line(s) => &s.common,
            LayerStyle::Fill(s) => &s.common,
            LayerStyle::AnimatedPath(s) => &s.line.common,
            LayerStyle::Text(s) => &s.common,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            LayerStyle::Circle(_) => "circle",
            LayerStyle::Line(_) => "line",
            LayerStyle::Fill(_) => "fill",
            LayerStyle::AnimatedPath(_) => "animatedArrowPath",
            LayerStyle::Text(_) => "text",
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, LayerStyle::AnimatedPath(_))
    }

    /// Whether the layer is drawn at all at this zoom (min inclusive, max
    /// exclusive)
    pub fn visible_at(&self, zoom: f64) -> bool {
        let common = self.common();
        common.min_zoom.is_none_or(|min| zoom >= min)
            && common.max_zoom.is_none_or(|max| zoom < max)
    }
}

/// Radius of highlighted nodes at a zoom level.
///
/// Grows exponentially within bands ending at zoom 10, 15 and 20, then
/// linearly by 2 px per zoom level.
pub fn node_radius_for_zoom(zoom: f64) -> f64 {
    if zoom <= 10.0 {
        2.0 * 2f64.powf(zoom / 10.0)
    } else if zoom <= 15.0 {
        2.0 + 4.0 * 2f64.powf((zoom - 10.0) / 5.0)
    } else if zoom <= 20.0 {
        6.0 + 6.0 * 2f64.powf((zoom - 15.0) / 5.0)
    } else {
        12.0 + (zoom - 20.0) * 2.0
    }
}
