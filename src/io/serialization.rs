// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation wire formats.
//!
//! This module is the only place editor shapes cross into JSON. It covers
//! the stored box annotation file, the session payloads the editors load,
//! and the save requests they emit.

use crate::editor::shapes::ShapeModel;
use crate::error::EditorError;
use crate::models::annotation::{
    round_px, BoundingBox, CropAnnotations, CropFlags, DefectLabel, Point,
};
use serde::{Deserialize, Serialize};

/// A bounding box as stored. The label stays a string so unknown
/// categories can be reported and skipped instead of failing the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxRecord {
    #[serde(serialize_with = "round_px")]
    pub left: f64,
    #[serde(serialize_with = "round_px")]
    pub top: f64,
    #[serde(serialize_with = "round_px")]
    pub width: f64,
    #[serde(serialize_with = "round_px")]
    pub height: f64,
    pub label: String,
}

impl BoxRecord {
    pub fn from_box(rect: &BoundingBox) -> Self {
        let r = rect.rounded();
        Self {
            left: r.left,
            top: r.top,
            width: r.width,
            height: r.height,
            label: r.label.id().to_string(),
        }
    }

    /// Editor box for this record, or `None` if the label is unknown.
    pub fn to_box(&self) -> Option<BoundingBox> {
        let label = DefectLabel::from_id(&self.label)?;
        Some(BoundingBox::from_corners(
            Point::new(self.left, self.top),
            Point::new(self.left + self.width, self.top + self.height),
            label,
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxList {
    #[serde(rename = "boundingBoxes", default)]
    pub bounding_boxes: Vec<BoxRecord>,
}

/// `{ "boundingBox": { "boundingBoxes": [...] } }`, the stored box file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxAnnotationFile {
    #[serde(rename = "boundingBox", default)]
    pub bounding_box: BoundingBoxList,
}

/// What the box editor loads.
///
/// `annotations` is a list for historical reasons; only its first element
/// carries data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectSessionPayload {
    pub image_url: String,
    #[serde(default)]
    pub annotations: Vec<BoxAnnotationFile>,
}

/// What the box editor saves: a flat list of rounded boxes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBoxesRequest {
    pub bounding_boxes: Vec<BoxRecord>,
}

/// What the crop editor loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropSessionPayload {
    pub image_url: String,
    #[serde(default)]
    pub image_metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub annotations: CropAnnotations,
}

/// Boxes from the first annotation entry. Unknown labels are dropped with
/// a warning.
pub fn boxes_from_annotations(annotations: &[BoxAnnotationFile]) -> Vec<BoundingBox> {
    let Some(first) = annotations.first() else {
        return Vec::new();
    };
    first
        .bounding_box
        .bounding_boxes
        .iter()
        .filter_map(|record| {
            let rect = record.to_box();
            if rect.is_none() {
                log::warn!("Skipping box with unknown label '{}'", record.label);
            }
            rect
        })
        .collect()
}

/// Shape model seeded from stored crop annotations.
pub fn shapes_from_crop(crop: &CropAnnotations, min_box_size: f64) -> ShapeModel {
    ShapeModel::with_crop(min_box_size, crop.polygon.clone(), crop.rotation_line)
}

/// Save request for every committed box.
pub fn boxes_request(shapes: &ShapeModel) -> SaveBoxesRequest {
    SaveBoxesRequest {
        bounding_boxes: shapes.boxes().iter().map(BoxRecord::from_box).collect(),
    }
}

/// Wrap a save request in the stored file shape.
pub fn box_file_from_request(request: SaveBoxesRequest) -> BoxAnnotationFile {
    BoxAnnotationFile {
        bounding_box: BoundingBoxList {
            bounding_boxes: request.bounding_boxes,
        },
    }
}

/// Crop annotation to save, including the current flags.
///
/// Fails unless a polygon with at least three points is committed.
pub fn crop_from_shapes(
    shapes: &ShapeModel,
    flags: CropFlags,
) -> Result<CropAnnotations, EditorError> {
    let polygon = match shapes.polygon() {
        Some(points) => points.to_vec(),
        None => {
            return Err(EditorError::TooFewPolygonPoints {
                count: shapes.pending_polygon().len(),
            })
        }
    };
    if polygon.len() < crate::editor::shapes::MIN_POLYGON_POINTS {
        return Err(EditorError::TooFewPolygonPoints { count: polygon.len() });
    }
    Ok(CropAnnotations {
        polygon,
        rotation_line: shapes.line().copied(),
        is_double: flags.is_double,
        is_vertical: flags.is_vertical,
        is_2h: flags.is_2h,
    })
}
