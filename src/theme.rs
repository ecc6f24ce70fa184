// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Theme colors and constants
//!
//! All colors use hexadecimal format: Color::from_rgb8(0xRR, 0xGG, 0xBB)

use peniko::Color;

// ============================================================================
// BASE COLORS
// ============================================================================
const BASE_WHITE: Color = Color::from_rgb8(0xff, 0xff, 0xff);
const BASE_GRAY: Color = Color::from_rgb8(0x80, 0x80, 0x80);

// ============================================================================
// LAYER DEFAULTS -- Used when a style channel cannot be resolved
// ============================================================================
const LAYER_DEFAULT: Color = Color::from_rgb8(0x00, 0x86, 0xff);
const LAYER_CONTOUR: Color = BASE_WHITE;

// ============================================================================
// POLYGON DRAW TOOL
// ============================================================================
const POLYGON_ACCENT: Color = Color::from_rgb8(0xeb, 0xa1, 0x34);
const POLYGON_POINT_STROKE: Color = BASE_WHITE;

// ============================================================================
// MEASURE TOOL
// ============================================================================
const MEASURE_LINE: Color = Color::from_rgb8(0xff, 0x00, 0xff);
const MEASURE_POINT: Color = Color::from_rgb8(0xff, 0x00, 0xff);
const MEASURE_POINT_STROKE: Color = BASE_WHITE;
const MEASURE_LABEL: Color = Color::from_rgb8(0x20, 0x20, 0x20);

// ============================================================================
// PUBLIC API
// ============================================================================

/// Fallback colors for map layers
pub mod layer {
    use super::Color;
    /// Used when no color channel is configured or it cannot be parsed
    pub const DEFAULT: Color = super::LAYER_DEFAULT;
    /// Stroke drawn under animated paths
    pub const CONTOUR: Color = super::LAYER_CONTOUR;
    /// Used when a per-feature color property is invalid
    pub const INVALID_PROPERTY: Color = super::BASE_GRAY;
}

/// Polygon draw tool overlays
pub mod polygon_tool {
    use super::Color;
    pub const ACCENT: Color = super::POLYGON_ACCENT;
    pub const POINT_STROKE: Color = super::POLYGON_POINT_STROKE;
}

/// Measure tool overlays
pub mod measure_tool {
    use super::Color;
    pub const LINE: Color = super::MEASURE_LINE;
    pub const POINT: Color = super::MEASURE_POINT;
    pub const POINT_STROKE: Color = super::MEASURE_POINT_STROKE;
    pub const LABEL: Color = super::MEASURE_LABEL;
}
