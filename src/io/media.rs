// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading.
//!
//! This module decodes the orthophoto behind a signed read URL into RGBA
//! pixels suitable for an egui texture.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// A decoded RGBA image.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Resolve a signed read URL to a local path.
///
/// Only `file://` URLs (what the local object store hands out) and bare
/// paths are readable; the query string carrying the expiry is dropped.
pub fn path_from_url(url: &str) -> Result<PathBuf> {
    if url.is_empty() {
        bail!("Missing image URL");
    }
    let without_query = url.split('?').next().unwrap_or(url);
    if let Some(path) = without_query.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if without_query.contains("://") {
        bail!("Unsupported image URL scheme: {}", without_query);
    }
    Ok(PathBuf::from(without_query))
}

/// Load and decode an image file.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to decode image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        bail!("Image {} is empty", path.display());
    }
    Ok(LoadedImage {
        width,
        height,
        pixels: img.into_raw(),
    })
}

/// Pixels ready for texture upload.
pub struct TexturePixels {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Shrink `source` so neither side exceeds `max_side`, keeping its aspect
/// ratio. Images that already fit are passed through untouched.
pub fn texture_pixels(source: LoadedImage, max_side: u32) -> Result<TexturePixels> {
    if max_side == 0 {
        bail!("Texture size limit is zero");
    }
    if source.width <= max_side && source.height <= max_side {
        return Ok(TexturePixels {
            width: source.width,
            height: source.height,
            pixels: source.pixels,
        });
    }
    let (width, height) = (source.width, source.height);
    let rgba = image::RgbaImage::from_raw(width, height, source.pixels)
        .context("Pixel buffer does not match the image size")?;
    let resized = image::DynamicImage::ImageRgba8(rgba).resize(
        max_side,
        max_side,
        image::imageops::FilterType::Triangle,
    );
    log::info!(
        "Downscaled {}x{} image to {}x{} for display",
        width,
        height,
        resized.width(),
        resized.height()
    );
    Ok(TexturePixels {
        width: resized.width(),
        height: resized.height(),
        pixels: resized.into_rgba8().into_raw(),
    })
}

/// Load the image behind a signed read URL.
pub fn load_image_url(url: &str) -> Result<LoadedImage> {
    let path = path_from_url(url)?;
    load_image(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_from_url() {
        assert_eq!(
            path_from_url("file:///data/orthos/a.jpg?expires=123").unwrap(),
            PathBuf::from("/data/orthos/a.jpg")
        );
        assert_eq!(path_from_url("local/a.png").unwrap(), PathBuf::from("local/a.png"));
        assert!(path_from_url("https://example.com/a.jpg").is_err());
        assert!(path_from_url("").is_err());
    }

    #[test]
    fn test_load_image_reports_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let loaded = load_image_url(&format!("file://{}?expires=1", path.display())).unwrap();
        assert_eq!(loaded.width, 3);
        assert_eq!(loaded.height, 2);
        assert_eq!(loaded.pixels.len(), 3 * 2 * 4);
        assert_eq!(&loaded.pixels[..4], &[10, 20, 30, 255]);
    }

    fn solid(width: u32, height: u32) -> LoadedImage {
        LoadedImage {
            width,
            height,
            pixels: vec![200; (width * height * 4) as usize],
        }
    }

    #[test]
    fn test_oversized_image_is_downscaled() {
        let texture = texture_pixels(solid(3000, 1000), 1000).unwrap();
        assert_eq!(texture.width, 1000);
        assert!((332..=334).contains(&texture.height));
        assert_eq!(
            texture.pixels.len(),
            (texture.width * texture.height * 4) as usize
        );
    }

    #[test]
    fn test_fitting_image_is_untouched() {
        let texture = texture_pixels(solid(640, 480), 640).unwrap();
        assert_eq!((texture.width, texture.height), (640, 480));
        assert_eq!(texture.pixels.len(), 640 * 480 * 4);
        assert!(texture_pixels(solid(4, 4), 0).is_err());
    }

    #[test]
    fn test_load_missing_image_fails() {
        assert!(load_image(Path::new("/definitely/not/here.png")).is_err());
    }
}
