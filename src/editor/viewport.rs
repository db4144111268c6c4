// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pan and zoom state of an editor canvas.

use crate::config::EditorConfig;
use crate::models::annotation::Point;
use crate::util::geometry::{fit_transform, to_image_space, Size, Transform};

/// Owns the display transform and keeps zoom within bounds.
///
/// Zoom bounds are multiples of the fit scale, so they mean the same
/// thing for a 500 px preview and a 20 000 px orthophoto.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    transform: Transform,
    fit_scale: f64,
    viewport_size: Size,
    image_size: Option<Size>,
    min_zoom: f64,
    max_zoom: f64,
    margin: f64,
}

impl Viewport {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            transform: Transform::default(),
            fit_scale: 1.0,
            viewport_size: Size::default(),
            image_size: None,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            margin: config.fit_margin,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    /// Zoom relative to the fit scale; `1.0` right after a reset.
    pub fn zoom_level(&self) -> f64 {
        self.transform.scale / self.fit_scale
    }

    pub fn to_image(&self, display: Point) -> Point {
        to_image_space(display, &self.transform)
    }

    /// Set the image to show and fit it to the current viewport.
    pub fn set_image(&mut self, image: Size) {
        self.image_size = Some(image);
        self.reset_to_fit();
    }

    /// Track a canvas resize. The first real size refits; later ones keep
    /// the operator's pan and zoom.
    pub fn set_viewport_size(&mut self, size: Size) {
        let first = self.viewport_size.is_empty();
        self.viewport_size = size;
        if first {
            self.reset_to_fit();
        }
    }

    /// Fit the whole image inside the viewport with a margin, centred.
    pub fn reset_to_fit(&mut self) {
        let Some(image) = self.image_size else {
            return;
        };
        if image.is_empty() || self.viewport_size.is_empty() {
            return;
        }
        self.transform = fit_transform(image, self.viewport_size, self.margin);
        self.fit_scale = self.transform.scale;
    }

    /// Scale by `factor` keeping the image point under `anchor` (display
    /// space) fixed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let fixed = self.to_image(anchor);
        let scale = (self.transform.scale * factor)
            .clamp(self.fit_scale * self.min_zoom, self.fit_scale * self.max_zoom);
        self.transform = Transform {
            scale,
            offset_x: anchor.x - fixed.x * scale,
            offset_y: anchor.y - fixed.y * scale,
        };
    }

    /// Zoom about the viewport centre.
    pub fn zoom_centered(&mut self, factor: f64) {
        self.zoom_at(self.viewport_size.center(), factor);
    }

    /// Translate by a display-space delta. Panning is unbounded.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.transform.offset_x += dx;
        self.transform.offset_y += dy;
    }
}
