// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Viewport transformation between geographic and screen coordinates.
//!
//! The map uses the Web-Mercator projection with 512 pixel tiles: at zoom
//! `z` the whole world is `512 * 2^z` pixels wide. Screen coordinates have
//! their origin at the top-left corner of the canvas with y growing
//! downwards; geographic coordinates are longitude/latitude in degrees.

use std::f64::consts::PI;

use geo::{Coord, Rect};
use kurbo::{Point, Size, Vec2};

use crate::settings;

/// Equatorial circumference used for ground resolution (meters)
const EARTH_CIRCUMFERENCE: f64 = 40_075_016.686;

/// Maps between canvas pixels and longitude/latitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    center: geo::Point,
    zoom: f64,
    size: Size,
}

impl Default for Viewport {
    fn default() -> Self {
        let (lon, lat) = settings::map::DEFAULT_CENTER;
        Self::new(
            geo::Point::new(lon, lat),
            settings::map::DEFAULT_ZOOM,
            Size::new(1024.0, 768.0),
        )
    }
}

impl Viewport {
    pub fn new(center: geo::Point, zoom: f64, size: Size) -> Self {
        let mut viewport = Self {
            center: geo::Point::new(0.0, 0.0),
            zoom: settings::map::DEFAULT_ZOOM,
            size,
        };
        viewport.set_center(center);
        viewport.set_zoom(zoom);
        viewport
    }

    pub fn center(&self) -> geo::Point {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Set the center; latitude is clamped to the projection's range
    pub fn set_center(&mut self, center: geo::Point) {
        let max = settings::map::MAX_LATITUDE;
        if center.x().is_finite() && center.y().is_finite() {
            self.center = geo::Point::new(wrap_longitude(center.x()), center.y().clamp(-max, max));
        }
    }

    /// Set the zoom, clamped to the allowed range
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(settings::map::MIN_ZOOM, settings::map::MAX_ZOOM);
        }
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Width of the world in pixels at the current zoom
    fn world_size(&self) -> f64 {
        settings::map::TILE_SIZE * 2f64.powf(self.zoom)
    }

    // ===== Coordinate Conversion =====

    /// Convert a longitude/latitude to canvas pixels
    pub fn to_screen(&self, coordinate: geo::Point) -> Point {
        let world = self.world_size();
        let p = project(coordinate) * world;
        let c = project(self.center) * world;
        let half = Vec2::new(self.size.width / 2.0, self.size.height / 2.0);
        (p - c + half).to_point()
    }

    /// Convert canvas pixels to a longitude/latitude
    pub fn to_geo(&self, pixel: Point) -> geo::Point {
        let world = self.world_size();
        let c = project(self.center) * world;
        let half = Vec2::new(self.size.width / 2.0, self.size.height / 2.0);
        unproject((pixel.to_vec2() - half + c) / world)
    }

    // ===== Navigation =====

    /// Move the map content by `delta` pixels
    pub fn pan_by(&mut self, delta: Vec2) {
        let middle = Point::new(self.size.width / 2.0, self.size.height / 2.0);
        self.set_center(self.to_geo(middle - delta));
    }

    /// Change the zoom by `delta` levels around the center
    pub fn zoom_by(&mut self, delta: f64) {
        self.set_zoom(self.zoom + delta);
    }

    /// Center on `bounds` at the largest zoom that shows all of it with
    /// `padding` pixels free on each side
    pub fn fit_bounds(&mut self, bounds: Rect, padding: f64) {
        let min = project(bounds.min().into());
        let max = project(bounds.max().into());
        let extent = Vec2::new((max.x - min.x).abs(), (max.y - min.y).abs());

        let available = Size::new(
            (self.size.width - 2.0 * padding).max(1.0),
            (self.size.height - 2.0 * padding).max(1.0),
        );
        let tile = settings::map::TILE_SIZE;
        let scale_x = available.width / (extent.x * tile);
        let scale_y = available.height / (extent.y * tile);
        let zoom = scale_x.min(scale_y).log2();

        self.set_center(unproject((min + max) / 2.0));
        if zoom.is_finite() {
            self.set_zoom(zoom);
        }
    }

    /// Ground distance covered by one pixel at `latitude` (meters)
    pub fn meters_per_pixel(&self, latitude: f64) -> f64 {
        EARTH_CIRCUMFERENCE * latitude.to_radians().cos() / self.world_size()
    }

    /// The visible area as a longitude/latitude rectangle
    pub fn bounds(&self) -> Rect {
        let top_left = self.to_geo(Point::ZERO);
        let bottom_right = self.to_geo(Point::new(self.size.width, self.size.height));
        Rect::new(
            Coord {
                x: top_left.x(),
                y: bottom_right.y(),
            },
            Coord {
                x: bottom_right.x(),
                y: top_left.y(),
            },
        )
    }
}

/// Web-Mercator projection into the unit square, y down
fn project(coordinate: geo::Point) -> Vec2 {
    let max = settings::map::MAX_LATITUDE;
    let lat = coordinate.y().clamp(-max, max).to_radians();
    let x = (coordinate.x() + 180.0) / 360.0;
    let y = (1.0 - (PI / 4.0 + lat / 2.0).tan().ln() / PI) / 2.0;
    Vec2::new(x, y)
}

fn unproject(unit: Vec2) -> geo::Point {
    let lon = unit.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * unit.y)).sinh().atan().to_degrees();
    geo::Point::new(lon, lat)
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-7;

    fn montreal() -> Viewport {
        Viewport::new(
            geo::Point::new(-73.6131, 45.5041),
            13.0,
            Size::new(800.0, 600.0),
        )
    }

    #[test]
    fn center_maps_to_canvas_middle() {
        let vp = montreal();
        let p = vp.to_screen(vp.center());
        assert!((p.x - 400.0).abs() < EPSILON);
        assert!((p.y - 300.0).abs() < EPSILON);
    }

    #[test]
    fn screen_geo_round_trip() {
        let vp = montreal();
        let pixel = Point::new(123.0, 456.0);
        let back = vp.to_screen(vp.to_geo(pixel));
        assert!((back.x - pixel.x).abs() < 1e-6);
        assert!((back.y - pixel.y).abs() < 1e-6);
    }

    #[test]
    fn north_is_up() {
        let vp = montreal();
        let north = vp.to_screen(geo::Point::new(-73.6131, 45.6));
        assert!(north.y < 300.0);
        let east = vp.to_screen(geo::Point::new(-73.5, 45.5041));
        assert!(east.x > 400.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = montreal();
        vp.set_zoom(40.0);
        assert_eq!(vp.zoom(), settings::map::MAX_ZOOM);
        vp.zoom_by(-100.0);
        assert_eq!(vp.zoom(), settings::map::MIN_ZOOM);
        vp.set_zoom(f64::NAN);
        assert_eq!(vp.zoom(), settings::map::MIN_ZOOM);
    }

    #[test]
    fn pan_moves_content_with_pointer() {
        let mut vp = montreal();
        let target = geo::Point::new(-73.6, 45.51);
        let before = vp.to_screen(target);
        vp.pan_by(Vec2::new(50.0, -20.0));
        let after = vp.to_screen(target);
        assert!((after.x - before.x - 50.0).abs() < 1e-6);
        assert!((after.y - before.y + 20.0).abs() < 1e-6);
    }

    #[test]
    fn fit_bounds_shows_whole_rect() {
        let mut vp = montreal();
        let rect = Rect::new(Coord { x: -73.9, y: 45.4 }, Coord { x: -73.4, y: 45.7 });
        vp.fit_bounds(rect, 20.0);

        for corner in [rect.min(), rect.max()] {
            let p = vp.to_screen(corner.into());
            assert!(p.x >= 20.0 - 1e-6 && p.x <= 780.0 + 1e-6, "{p:?}");
            assert!(p.y >= 20.0 - 1e-6 && p.y <= 580.0 + 1e-6, "{p:?}");
        }
    }

    #[test]
    fn ground_resolution_at_equator() {
        let vp = Viewport::new(geo::Point::new(0.0, 0.0), 0.0, Size::new(512.0, 512.0));
        assert!((vp.meters_per_pixel(0.0) - 78_271.517).abs() < 0.01);
        assert!(vp.meters_per_pixel(60.0) < vp.meters_per_pixel(0.0));
    }

    #[test]
    fn bounds_contain_center() {
        let vp = montreal();
        let b = vp.bounds();
        let c = vp.center();
        assert!(b.min().x < c.x() && c.x() < b.max().x);
        assert!(b.min().y < c.y() && c.y() < b.max().y);
    }
}
