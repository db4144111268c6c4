// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the shapes the two editors produce: labelled
//! bounding boxes for defect review, and the crop polygon, rotation line
//! and mounting flags for crop-and-rotate correction.
//!
//! All coordinates are image-space pixels held as `f64`. They are rounded
//! to whole pixels only when serialized, so repeated edits never compound
//! rounding error.

use serde::{Deserialize, Serialize, Serializer};

/// Serialize an image-space coordinate as a whole pixel.
pub(crate) fn round_px<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(value.round() as i64)
}

/// A 2D point in image-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    #[serde(serialize_with = "round_px")]
    pub x: f64,
    #[serde(serialize_with = "round_px")]
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Defect category attached to a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefectLabel {
    DefaultPanel,
    Hotspots,
    FaultyDiodes,
    OfflinePanels,
}

impl DefectLabel {
    /// Every category, in shortcut order (key `1` selects the first).
    pub const ALL: [DefectLabel; 4] = [
        DefectLabel::DefaultPanel,
        DefectLabel::Hotspots,
        DefectLabel::FaultyDiodes,
        DefectLabel::OfflinePanels,
    ];

    /// Identifier used in the persisted JSON.
    pub fn id(&self) -> &'static str {
        match self {
            DefectLabel::DefaultPanel => "default_panel",
            DefectLabel::Hotspots => "hotspots",
            DefectLabel::FaultyDiodes => "faultydiodes",
            DefectLabel::OfflinePanels => "offlinepanels",
        }
    }

    /// Parse a persisted identifier.
    ///
    /// The inference job emits `solarpanels` for plain panels; it is read
    /// as [`DefectLabel::DefaultPanel`].
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "default_panel" | "solarpanels" => Some(DefectLabel::DefaultPanel),
            "hotspots" => Some(DefectLabel::Hotspots),
            "faultydiodes" => Some(DefectLabel::FaultyDiodes),
            "offlinepanels" => Some(DefectLabel::OfflinePanels),
            _ => None,
        }
    }

    /// Human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            DefectLabel::DefaultPanel => "Default Panel",
            DefectLabel::Hotspots => "Hotspots",
            DefectLabel::FaultyDiodes => "Faulty Diodes",
            DefectLabel::OfflinePanels => "Offline Panels",
        }
    }

    /// Stroke colour as RGB.
    pub fn color(&self) -> [u8; 3] {
        match self {
            DefectLabel::DefaultPanel => [0x22, 0xc5, 0x5e],
            DefectLabel::Hotspots => [0xef, 0x44, 0x44],
            DefectLabel::FaultyDiodes => [0xf9, 0x73, 0x16],
            DefectLabel::OfflinePanels => [0xea, 0xb3, 0x08],
        }
    }

    /// Category selected by a number-key shortcut (`1`-based).
    pub fn from_shortcut(digit: u8) -> Option<Self> {
        let index = usize::from(digit).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }
}

impl Default for DefectLabel {
    fn default() -> Self {
        DefectLabel::DefaultPanel
    }
}

impl std::fmt::Display for DefectLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// An axis-aligned labelled box. `left`/`top` is the top-left corner and
/// the extent is never negative once stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub label: DefectLabel,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64, label: DefectLabel) -> Self {
        Self {
            left,
            top,
            width,
            height,
            label,
        }
    }

    /// Build a box spanning two arbitrary corners.
    pub fn from_corners(a: Point, b: Point, label: DefectLabel) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
            label,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Corners in the order top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right(), self.top),
            Point::new(self.right(), self.bottom()),
            Point::new(self.left, self.bottom()),
        ]
    }

    /// Check if a point lies inside the box (edges inclusive).
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    /// Same box with every coordinate rounded to whole pixels.
    pub fn rounded(&self) -> Self {
        Self {
            left: self.left.round(),
            top: self.top.round(),
            width: self.width.round(),
            height: self.height.round(),
            label: self.label,
        }
    }
}

/// Line drawn along the tracker inclination for rotation correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationLine {
    pub start: Point,
    pub end: Point,
}

/// Panel mounting geometry flags. They are independent of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropFlags {
    pub is_double: bool,
    pub is_vertical: bool,
    pub is_2h: bool,
}

/// One of the three [`CropFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropFlag {
    Double,
    Vertical,
    TwoH,
}

impl CropFlag {
    pub const ALL: [CropFlag; 3] = [CropFlag::Double, CropFlag::Vertical, CropFlag::TwoH];

    pub fn name(&self) -> &'static str {
        match self {
            CropFlag::Double => "Double panel",
            CropFlag::Vertical => "Vertical",
            CropFlag::TwoH => "2H",
        }
    }
}

impl CropFlags {
    pub fn get(&self, flag: CropFlag) -> bool {
        match flag {
            CropFlag::Double => self.is_double,
            CropFlag::Vertical => self.is_vertical,
            CropFlag::TwoH => self.is_2h,
        }
    }

    pub fn set(&mut self, flag: CropFlag, value: bool) {
        match flag {
            CropFlag::Double => self.is_double = value,
            CropFlag::Vertical => self.is_vertical = value,
            CropFlag::TwoH => self.is_2h = value,
        }
    }
}

/// Persisted crop-and-rotate annotation.
///
/// The polygon is stored open: the edge from the last point back to the
/// first is implied and never written as a duplicate point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropAnnotations {
    #[serde(default)]
    pub polygon: Vec<Point>,
    #[serde(default)]
    pub rotation_line: Option<RotationLine>,
    #[serde(default)]
    pub is_double: bool,
    #[serde(default)]
    pub is_vertical: bool,
    #[serde(default, rename = "is2H")]
    pub is_2h: bool,
}

impl CropAnnotations {
    pub fn flags(&self) -> CropFlags {
        CropFlags {
            is_double: self.is_double,
            is_vertical: self.is_vertical,
            is_2h: self.is_2h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_from_corners_normalizes() {
        let b = BoundingBox::from_corners(
            Point::new(40.0, 10.0),
            Point::new(10.0, 50.0),
            DefectLabel::Hotspots,
        );
        assert_eq!(b.left, 10.0);
        assert_eq!(b.top, 10.0);
        assert_eq!(b.width, 30.0);
        assert_eq!(b.height, 40.0);
    }

    #[test]
    fn test_label_ids() {
        for label in DefectLabel::ALL {
            assert_eq!(DefectLabel::from_id(label.id()), Some(label));
        }
        assert_eq!(DefectLabel::from_id("solarpanels"), Some(DefectLabel::DefaultPanel));
        assert_eq!(DefectLabel::from_id("cracks"), None);
    }

    #[test]
    fn test_label_shortcuts() {
        assert_eq!(DefectLabel::from_shortcut(1), Some(DefectLabel::DefaultPanel));
        assert_eq!(DefectLabel::from_shortcut(4), Some(DefectLabel::OfflinePanels));
        assert_eq!(DefectLabel::from_shortcut(0), None);
        assert_eq!(DefectLabel::from_shortcut(5), None);
    }

    #[test]
    fn test_points_serialize_as_whole_pixels() {
        let json = serde_json::to_value(Point::new(10.4, 19.6)).unwrap();
        assert_eq!(json, serde_json::json!({"x": 10, "y": 20}));
    }

    #[test]
    fn test_crop_annotations_field_names() {
        let crop = CropAnnotations {
            polygon: vec![Point::new(1.0, 2.0)],
            rotation_line: None,
            is_double: true,
            is_vertical: false,
            is_2h: true,
        };
        let json = serde_json::to_value(&crop).unwrap();
        assert_eq!(json["is2H"], true);
        assert_eq!(json["isDouble"], true);
        assert_eq!(json["rotationLine"], serde_json::Value::Null);
        assert_eq!(json["polygon"][0]["x"], 1);
    }

    #[test]
    fn test_crop_flags_roundtrip_through_setters() {
        let mut flags = CropFlags::default();
        flags.set(CropFlag::Vertical, true);
        assert!(flags.get(CropFlag::Vertical));
        assert!(!flags.get(CropFlag::Double));
        assert!(!flags.get(CropFlag::TwoH));
    }
}
