// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the transform between display space (what pointer
//! events report, after pan and zoom) and image space (pixels of the
//! source image), plus the hit-testing helpers the editors use.

use crate::models::annotation::Point;

/// Width and height of an image or viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Maps image-space `(x, y)` to display-space `(x * scale + offset_x, y * scale + offset_y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// Convert a display-space point to image space.
pub fn to_image_space(display: Point, transform: &Transform) -> Point {
    Point {
        x: (display.x - transform.offset_x) / transform.scale,
        y: (display.y - transform.offset_y) / transform.scale,
    }
}

/// Convert an image-space point to display space.
pub fn to_display_space(image: Point, transform: &Transform) -> Point {
    Point {
        x: image.x * transform.scale + transform.offset_x,
        y: image.y * transform.scale + transform.offset_y,
    }
}

/// Transform that fits `image` inside `viewport`, scaled by `margin` and centred.
///
/// Degenerate sizes fall back to the identity transform.
pub fn fit_transform(image: Size, viewport: Size, margin: f64) -> Transform {
    if image.is_empty() || viewport.is_empty() {
        return Transform::default();
    }
    let scale = (viewport.width / image.width).min(viewport.height / image.height) * margin;
    Transform {
        scale,
        offset_x: (viewport.width - image.width * scale) / 2.0,
        offset_y: (viewport.height - image.height * scale) / 2.0,
    }
}

/// Even-odd test of a point against a polygon with an implied closing edge.
pub fn point_in_polygon(point: &Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Shortest distance from a point to the segment `a`-`b`.
pub fn distance_to_segment(point: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return point.distance_to(a);
    }
    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    point.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_close(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < EPS, "x: {} vs {}", a.x, b.x);
        assert!((a.y - b.y).abs() < EPS, "y: {} vs {}", a.y, b.y);
    }

    #[test]
    fn test_display_image_roundtrip() {
        let transforms = [
            Transform::default(),
            Transform {
                scale: 0.37,
                offset_x: 12.5,
                offset_y: -40.0,
            },
            Transform {
                scale: 19.0,
                offset_x: -3000.0,
                offset_y: 250.25,
            },
        ];
        let points = [
            Point::new(0.0, 0.0),
            Point::new(960.0, 540.0),
            Point::new(-15.3, 7_000.9),
        ];
        for t in &transforms {
            for p in points {
                assert_close(to_image_space(to_display_space(p, t), t), p);
                assert_close(to_display_space(to_image_space(p, t), t), p);
            }
        }
    }

    #[test]
    fn test_fit_transform_centers_image() {
        let t = fit_transform(Size::new(2000.0, 1000.0), Size::new(1000.0, 1000.0), 0.9);
        assert!((t.scale - 0.45).abs() < EPS);
        assert!((t.offset_x - 50.0).abs() < EPS);
        assert!((t.offset_y - 275.0).abs() < EPS);

        // Image centre lands on viewport centre
        let c = to_display_space(Point::new(1000.0, 500.0), &t);
        assert_close(c, Point::new(500.0, 500.0));
    }

    #[test]
    fn test_fit_transform_degenerate() {
        let t = fit_transform(Size::new(0.0, 100.0), Size::new(800.0, 600.0), 0.9);
        assert_eq!(t, Transform::default());
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(point_in_polygon(&Point::new(5.0, 5.0), &square));
        assert!(!point_in_polygon(&Point::new(15.0, 5.0), &square));
        assert!(!point_in_polygon(&Point::new(5.0, 5.0), &square[..2]));
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((distance_to_segment(&Point::new(5.0, 3.0), &a, &b) - 3.0).abs() < EPS);
        assert!((distance_to_segment(&Point::new(13.0, 4.0), &a, &b) - 5.0).abs() < EPS);
        assert!((distance_to_segment(&Point::new(3.0, 4.0), &a, &a) - 5.0).abs() < EPS);
    }
}
