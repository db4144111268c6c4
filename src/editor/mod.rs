// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation editor core.
//!
//! The editors are split into independent pieces: the shape model holds
//! what has been drawn (image space), the viewport owns the display
//! transform, the interaction reducer turns input events into changes to
//! either, and rendering is a pure function of the three.

pub mod interaction;
pub mod render;
pub mod shapes;
pub mod viewport;

/// Current drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Select,
    DrawBox,
    DrawPolygon,
    DrawLine,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Select => "Select",
            Mode::DrawBox => "Box",
            Mode::DrawPolygon => "Polygon",
            Mode::DrawLine => "Line",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Mode::Select => "Drag to pan, click a shape to select it",
            Mode::DrawBox => "Drag to draw a box, keys 1-4 pick the label",
            Mode::DrawPolygon => "Click to add vertices, then Finish Polygon",
            Mode::DrawLine => "Click the start point, then the end point",
        }
    }
}

/// Which of the two editors a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// Defect review: labelled bounding boxes.
    Boxes,
    /// Crop and rotate: one polygon, one rotation line, mounting flags.
    Crop,
}

impl EditorKind {
    /// Tools offered by the editor.
    pub fn modes(&self) -> &'static [Mode] {
        match self {
            EditorKind::Boxes => &[Mode::Select, Mode::DrawBox],
            EditorKind::Crop => &[Mode::Select, Mode::DrawPolygon, Mode::DrawLine],
        }
    }

    /// Tool active when a session opens.
    pub fn initial_mode(&self) -> Mode {
        match self {
            EditorKind::Boxes => Mode::DrawBox,
            EditorKind::Crop => Mode::Select,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EditorKind::Boxes => "Review Detections",
            EditorKind::Crop => "Crop & Rotate",
        }
    }
}
