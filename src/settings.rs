// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Map settings and configuration constants.
//!
//! This module holds non-visual settings that stay stable across theme
//! changes. Visual styling (colors, sizes) belongs in `theme.rs`.

// ============================================================================
// VIEWPORT SETTINGS
// ============================================================================
/// Minimum zoom level (whole world)
const MIN_ZOOM: f64 = 0.0;

/// Maximum zoom level (street detail)
const MAX_ZOOM: f64 = 24.0;

/// Zoom used when no preference has been stored yet
const DEFAULT_ZOOM: f64 = 15.0;

/// Center used when no preference has been stored yet (lon, lat)
const DEFAULT_CENTER: (f64, f64) = (-73.6131, 45.5041);

/// Web-Mercator tile size in pixels
const TILE_SIZE: f64 = 512.0;

/// Latitude limit of the Web-Mercator projection
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

// ============================================================================
// PICKING SETTINGS
// ============================================================================
/// Tolerance around the cursor when picking objects (screen pixels)
const PICK_RADIUS: f64 = 4.0;

// ============================================================================
// BOUNDS SETTINGS
// ============================================================================
/// Smallest width or height of a bounding box fitted to layer data (degrees).
/// A single point or a perfectly straight line would otherwise give a zero
/// sized box that no viewport can fit.
const MIN_BBOX_DELTA: f64 = 0.001;

/// Padding around fitted bounds (screen pixels)
const FIT_PADDING: f64 = 20.0;

/// Fraction of the viewport trimmed on each side before testing whether
/// data is already visible
const VIEWPORT_MARGIN_RATIO: f64 = 0.05;

// ============================================================================
// TOOL SETTINGS
// ============================================================================
/// Vertices closer than this are treated as the same click (degrees)
const VERTEX_DEDUP_EPSILON: f64 = 1e-9;

/// Distances at or above this are shown in kilometers (meters)
const KILOMETER_THRESHOLD: f64 = 1000.0;

// ============================================================================
// PREFERENCE KEYS
// ============================================================================
const PREF_ENABLE_ANIMATIONS: &str = "map.enableMapAnimations";
const PREF_ZOOM: &str = "map.zoom";
const PREF_CENTER: &str = "map.center";
const PREF_HIDDEN_LAYERS: &str = "map.hiddenLayers";

// ============================================================================
// PUBLIC API - Don't edit below this line unless you know what you're doing
// ============================================================================

/// Map viewport settings (zoom limits, projection)
pub mod map {
    /// Minimum zoom level
    pub const MIN_ZOOM: f64 = super::MIN_ZOOM;

    /// Maximum zoom level
    pub const MAX_ZOOM: f64 = super::MAX_ZOOM;

    /// Initial zoom when nothing is stored in preferences
    pub const DEFAULT_ZOOM: f64 = super::DEFAULT_ZOOM;

    /// Initial center (lon, lat) when nothing is stored in preferences
    pub const DEFAULT_CENTER: (f64, f64) = super::DEFAULT_CENTER;

    pub const TILE_SIZE: f64 = super::TILE_SIZE;
    pub const MAX_LATITUDE: f64 = super::MAX_LATITUDE;
}

/// Picking tolerance
pub mod picking {
    /// Radius around the cursor searched for objects (screen pixels)
    pub const RADIUS: f64 = super::PICK_RADIUS;
}

/// Safe bounds computation for fitting the view to layer data
pub mod bounds {
    pub const MIN_DELTA: f64 = super::MIN_BBOX_DELTA;
    pub const FIT_PADDING: f64 = super::FIT_PADDING;
    pub const VIEWPORT_MARGIN_RATIO: f64 = super::VIEWPORT_MARGIN_RATIO;
}

/// Edit tool settings
pub mod tools {
    pub const VERTEX_EPSILON: f64 = super::VERTEX_DEDUP_EPSILON;
    pub const KILOMETER_THRESHOLD: f64 = super::KILOMETER_THRESHOLD;
}

/// Preference keys read and written by the map
pub mod prefs {
    pub const ENABLE_ANIMATIONS: &str = super::PREF_ENABLE_ANIMATIONS;
    pub const ZOOM: &str = super::PREF_ZOOM;
    pub const CENTER: &str = super::PREF_CENTER;
    pub const HIDDEN_LAYERS: &str = super::PREF_HIDDEN_LAYERS;
}
