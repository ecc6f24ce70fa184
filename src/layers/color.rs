// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Color literals used by layer styles and feature properties.
//!
//! Two forms are accepted: hex strings (`#RRGGBB` or `#RRGGBBAA`) and
//! component arrays (`[r, g, b]` or `[r, g, b, a]`, 0-255).

use peniko::Color;
use serde_json::Value;

use crate::error::ConfigError;

/// Parse a `#RRGGBB` or `#RRGGBBAA` hex literal
pub fn parse_hex(literal: &str) -> Result<Color, ConfigError> {
    let invalid = || ConfigError::InvalidColor(literal.to_string());
    let hex = literal.strip_prefix('#').ok_or_else(invalid)?;
    if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
        return Err(invalid());
    }

    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 { byte(6)? } else { 0xff };
    Ok(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, alpha))
}

/// Interpret a JSON value as a color, if it has one of the accepted forms
pub fn from_json(value: &Value) -> Option<Color> {
    match value {
        Value::String(s) => parse_hex(s).ok(),
        Value::Array(items) if items.len() == 3 || items.len() == 4 => {
            let mut rgba = [0u8, 0, 0, 0xff];
            for (slot, item) in rgba.iter_mut().zip(items) {
                let v = item.as_f64()?;
                if !(0.0..=255.0).contains(&v) {
                    return None;
                }
                *slot = v.round() as u8;
            }
            Some(Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]))
        }
        _ => None,
    }
}
