// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Layer and section configuration loaded from TOML.
//!
//! The configuration declares every layer's style and, per UI section, the
//! ordered list of layers enabled in that section. Channels are written as
//! literals (`color = "#0086ff"`, `radius = 4`), property lookups
//! (`color = { property = "color", default = "#0086ff" }`) or categorical
//! lookups (`{ property = "mode", categories = { bus = 11 }, default = 11 }`).

use std::collections::BTreeMap;

use peniko::Color;
use serde::Deserialize;

use super::color;
use super::store::LayerDefinition;
use super::style::{
    AnimatedPathStyle, Channel, CircleStyle, FillStyle, FromProperty, LayerCommon, LayerStyle,
    LineStyle, TextStyle,
};
use crate::error::ConfigError;
use crate::model::features;
use crate::theme;

/// The transit editor's built-in layers and sections
const TRANSIT_LAYERS: &str = include_str!("layers.toml");

/// Parsed map configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapConfig {
    /// Section name -> enabled layers, in draw order
    #[serde(default)]
    pub sections: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub layers: BTreeMap<String, LayerConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    Circle,
    Line,
    Fill,
    AnimatedArrowPath,
    Text,
}

/// Style of one layer as written in the configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub pickable: bool,
    pub opacity: Option<f64>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub feature_min_zoom: Option<ChannelConfig>,
    pub color: Option<ChannelConfig>,
    pub stroke_color: Option<ChannelConfig>,
    pub radius: Option<ChannelConfig>,
    pub width: Option<ChannelConfig>,
    pub stroke_width: Option<ChannelConfig>,
    pub text: Option<ChannelConfig>,
    pub size: Option<ChannelConfig>,
    pub radius_min_pixels: Option<f64>,
    pub radius_max_pixels: Option<f64>,
    pub width_min_pixels: Option<f64>,
    pub width_max_pixels: Option<f64>,
    #[serde(default)]
    pub scale_with_zoom: bool,
    #[serde(default)]
    pub stroked: bool,
}

fn default_true() -> bool {
    true
}

/// A literal channel value
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LiteralConfig {
    Number(f64),
    Text(String),
    Components(Vec<f64>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChannelConfig {
    Literal(LiteralConfig),
    Categorical {
        property: String,
        categories: BTreeMap<String, LiteralConfig>,
        default: Option<LiteralConfig>,
    },
    Property {
        property: String,
        default: Option<LiteralConfig>,
    },
}

/// Conversion of configuration literals to channel values
trait FromLiteral: Sized {
    fn from_literal(literal: &LiteralConfig, layer: &str) -> Result<Self, ConfigError>;
}

impl FromLiteral for f64 {
    fn from_literal(literal: &LiteralConfig, layer: &str) -> Result<Self, ConfigError> {
        match literal {
            LiteralConfig::Number(n) => Ok(*n),
            other => Err(invalid(layer, format!("expected a number, got {other:?}"))),
        }
    }
}

impl FromLiteral for Color {
    fn from_literal(literal: &LiteralConfig, layer: &str) -> Result<Self, ConfigError> {
        match literal {
            LiteralConfig::Text(hex) => color::parse_hex(hex),
            LiteralConfig::Components(rgba) => color::from_json(&serde_json::json!(rgba))
                .ok_or_else(|| invalid(layer, format!("invalid color components {rgba:?}"))),
            LiteralConfig::Number(n) => Err(invalid(layer, format!("expected a color, got {n}"))),
        }
    }
}

impl FromLiteral for String {
    fn from_literal(literal: &LiteralConfig, layer: &str) -> Result<Self, ConfigError> {
        match literal {
            LiteralConfig::Text(s) => Ok(s.clone()),
            LiteralConfig::Number(n) => Ok(n.to_string()),
            other => Err(invalid(layer, format!("expected text, got {other:?}"))),
        }
    }
}

fn invalid(layer: &str, reason: String) -> ConfigError {
    ConfigError::InvalidLayer {
        layer: layer.to_string(),
        reason,
    }
}

impl ChannelConfig {
    fn to_channel<T>(&self, layer: &str, fallback: T) -> Result<Channel<T>, ConfigError>
    where
        T: FromLiteral + FromProperty + Clone + 'static,
    {
        let default = |d: &Option<LiteralConfig>| match d {
            Some(literal) => T::from_literal(literal, layer),
            None => Ok(fallback.clone()),
        };
        Ok(match self {
            ChannelConfig::Literal(literal) => Channel::Constant(T::from_literal(literal, layer)?),
            ChannelConfig::Property { property, default: d } => {
                Channel::property(property.clone(), default(d)?)
            }
            ChannelConfig::Categorical {
                property,
                categories,
                default: d,
            } => {
                let table = categories
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), T::from_literal(v, layer)?)))
                    .collect::<Result<BTreeMap<String, T>, ConfigError>>()?;
                let otherwise = default(d)?;
                let property = property.clone();
                Channel::function(move |feature| {
                    features::property(feature, &property)
                        .and_then(|v| v.as_str())
                        .and_then(|key| table.get(key))
                        .cloned()
                        .unwrap_or_else(|| otherwise.clone())
                })
            }
        })
    }
}

fn channel<T>(
    cfg: &Option<ChannelConfig>,
    layer: &str,
    fallback: T,
) -> Result<Channel<T>, ConfigError>
where
    T: FromLiteral + FromProperty + Clone + 'static,
{
    match cfg {
        Some(c) => c.to_channel(layer, fallback),
        None => Ok(Channel::Constant(fallback)),
    }
}

fn optional_channel<T>(
    cfg: &Option<ChannelConfig>,
    layer: &str,
    fallback: T,
) -> Result<Option<Channel<T>>, ConfigError>
where
    T: FromLiteral + FromProperty + Clone + 'static,
{
    cfg.as_ref().map(|c| c.to_channel(layer, fallback)).transpose()
}

impl LayerConfig {
    /// Build the runtime style for layer `id`
    pub fn to_style(&self, id: &str) -> Result<LayerStyle, ConfigError> {
        let fallback = theme::layer::DEFAULT;
        let common = LayerCommon {
            opacity: self.opacity.unwrap_or(1.0),
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            feature_min_zoom: optional_channel(&self.feature_min_zoom, id, 0.0)?,
            pickable: self.pickable,
        };

        let line = |common: LayerCommon| -> Result<LineStyle, ConfigError> {
            Ok(LineStyle {
                common,
                color: channel(&self.color, id, fallback)?,
                width: channel(&self.width, id, 3.0)?,
                width_min_pixels: self.width_min_pixels,
                width_max_pixels: self.width_max_pixels,
            })
        };

        Ok(match self.kind {
            LayerKind::Circle => LayerStyle::Circle(CircleStyle {
                common,
                color: channel(&self.color, id, fallback)?,
                radius: channel(&self.radius, id, 5.0)?,
                stroke_color: optional_channel(&self.stroke_color, id, fallback)?,
                stroke_width: channel(&self.stroke_width, id, 1.0)?,
                radius_min_pixels: self.radius_min_pixels,
                radius_max_pixels: self.radius_max_pixels,
                scale_with_zoom: self.scale_with_zoom,
            }),
            LayerKind::Line => LayerStyle::Line(line(common)?),
            LayerKind::AnimatedArrowPath => LayerStyle::AnimatedPath(AnimatedPathStyle {
                line: line(common)?,
                stroked: self.stroked,
            }),
            LayerKind::Fill => LayerStyle::Fill(FillStyle {
                common,
                color: channel(&self.color, id, fallback)?,
                line_color: optional_channel(&self.stroke_color, id, fallback)?,
                line_width: channel(&self.stroke_width, id, 1.0)?,
            }),
            LayerKind::Text => LayerStyle::Text(TextStyle {
                common,
                color: channel(&self.color, id, fallback)?,
                text: match &self.text {
                    Some(c) => c.to_channel(id, String::new())?,
                    None => TextStyle::default().text,
                },
                size: channel(&self.size, id, 12.0)?,
            }),
        })
    }
}

impl MapConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// The transit editor's default layers and sections
    pub fn transit_default() -> Result<Self, ConfigError> {
        Self::from_toml(TRANSIT_LAYERS)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (section, layers) in &self.sections {
            if let Some(missing) = layers.iter().find(|l| !self.layers.contains_key(*l)) {
                return Err(ConfigError::UnknownSectionLayer {
                    section: section.clone(),
                    layer: missing.clone(),
                });
            }
        }
        Ok(())
    }

    /// Layers enabled in `section`; empty for an unknown section
    pub fn section_layers(&self, section: &str) -> &[String] {
        self.sections.get(section).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Runtime definitions for every configured layer
    pub fn definitions(&self) -> Result<Vec<LayerDefinition>, ConfigError> {
        self.layers
            .iter()
            .map(|(id, cfg)| {
                Ok(LayerDefinition {
                    id: id.clone(),
                    style: cfg.to_style(id)?,
                    default_filter: None,
                    visible: cfg.visible,
                })
            })
            .collect()
    }
}
