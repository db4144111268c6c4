// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor state machine.
//!
//! [`EditorState::dispatch`] takes the current state and one input event
//! and returns the next state together with the effect the host has to
//! carry out (repaint, show a rejection, or persist a save request).
//! Nothing in here touches storage or the UI toolkit.

use super::shapes::{Commit, DrawProgress, LineEnd, Selection, ShapeModel};
use super::viewport::Viewport;
use super::{EditorKind, Mode};
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::io::serialization::{self, SaveBoxesRequest};
use crate::models::annotation::{
    BoundingBox, CropAnnotations, CropFlag, CropFlags, DefectLabel, Point,
};
use crate::models::project::ProjectRef;
use crate::util::geometry::Size;

/// Lifecycle of an editor session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Waiting for the image and stored annotations.
    Loading,
    Ready,
    /// Terminal; the operator has to leave the editor.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Inline message shown until dismissed or replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Delete,
    Backspace,
    Escape,
    /// Number key `1`..`9`.
    Digit(u8),
}

/// Stored annotations handed to a freshly loaded session.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotations {
    Boxes(Vec<BoundingBox>),
    Crop(CropAnnotations),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    SessionLoaded { image: Size, annotations: Annotations },
    LoadFailed(String),
    ViewportResized(Size),
    PointerDown {
        pos: Point,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerMove { pos: Point },
    PointerUp { pos: Point },
    Wheel { pos: Point, delta_y: f64 },
    Key(EditorKey),
    SetMode(Mode),
    SetLabel(DefectLabel),
    RelabelSelected(DefectLabel),
    FinishPolygon,
    ClearPolygon,
    ClearLine,
    DeleteSelected,
    ZoomIn,
    ZoomOut,
    ResetView,
    SetFlag(CropFlag, bool),
    Save,
    /// Outcome of a save effect: success message or error text.
    SaveFinished(Result<String, String>),
    DismissNotice,
}

/// What the host has to do after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Redraw,
    Rejected(EditorError),
    SaveBoxes(SaveBoxesRequest),
    SaveCrop(CropAnnotations),
}

/// Pointer gesture in progress. Positions are display space for panning
/// and image space for shape edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drag {
    Pan { last: Point },
    DrawBox,
    MoveBox { index: usize, last: Point },
    ResizeBox { index: usize, anchor: Point },
    PolygonVertex(usize),
    LineEnd(LineEnd),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: EditorState,
    pub effect: Effect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub kind: EditorKind,
    pub status: SessionStatus,
    pub mode: Mode,
    pub shapes: ShapeModel,
    pub viewport: Viewport,
    pub image: Option<Size>,
    pub active_label: DefectLabel,
    pub flags: CropFlags,
    pub drag: Option<Drag>,
    pub saving: bool,
    pub notice: Option<Notice>,
    project: ProjectRef,
    config: EditorConfig,
}

impl EditorState {
    /// A loading session for `project`. Out-of-range settings fall back
    /// to their defaults.
    pub fn new(kind: EditorKind, config: EditorConfig, project: ProjectRef) -> Self {
        let config = config.validated();
        Self {
            kind,
            status: SessionStatus::Loading,
            mode: kind.initial_mode(),
            shapes: ShapeModel::new(config.min_box_size),
            viewport: Viewport::new(&config),
            image: None,
            active_label: DefectLabel::default(),
            flags: CropFlags::default(),
            drag: None,
            saving: false,
            notice: None,
            project,
            config,
        }
    }

    /// Project the session saves to.
    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.status == SessionStatus::Ready
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.drag, Some(Drag::Pan { .. }))
    }

    /// Apply one event and return the next state with its effect.
    pub fn dispatch(mut self, event: EditorEvent) -> Step {
        let effect = self.apply(event);
        if let Effect::Rejected(err) = &effect {
            self.notice = Some(Notice {
                kind: NoticeKind::Error,
                text: err.to_string(),
            });
        }
        Step { state: self, effect }
    }

    /// One-line summary for the status bar.
    pub fn status_line(&self) -> String {
        let shapes = match self.kind {
            EditorKind::Boxes => format!("{} boxes", self.shapes.boxes().len()),
            EditorKind::Crop => {
                let polygon = match self.shapes.polygon() {
                    Some(points) => format!("polygon {} pts", points.len()),
                    None if !self.shapes.pending_polygon().is_empty() => {
                        format!("drawing {} pts", self.shapes.pending_polygon().len())
                    }
                    None => "no polygon".to_string(),
                };
                let line = if self.shapes.line().is_some() { "line set" } else { "no line" };
                format!("{}, {}", polygon, line)
            }
        };
        format!(
            "{} | {} | zoom {:.0}%",
            self.mode.hint(),
            shapes,
            self.viewport.zoom_level() * 100.0
        )
    }

    fn apply(&mut self, event: EditorEvent) -> Effect {
        match event {
            EditorEvent::SessionLoaded { image, annotations } => self.load(image, annotations),
            EditorEvent::LoadFailed(message) => {
                log::error!("Editor session failed to load: {}", message);
                self.status = SessionStatus::Failed(message);
                self.drag = None;
                Effect::Redraw
            }
            EditorEvent::ViewportResized(size) => {
                if size == self.viewport.viewport_size() {
                    return Effect::None;
                }
                self.viewport.set_viewport_size(size);
                Effect::Redraw
            }
            EditorEvent::PointerDown { pos, button, modifiers } => {
                if !self.is_ready() {
                    return Effect::None;
                }
                self.pointer_down(pos, button, modifiers)
            }
            EditorEvent::PointerMove { pos } => self.pointer_move(pos),
            EditorEvent::PointerUp { pos } => self.pointer_up(pos),
            EditorEvent::Wheel { pos, delta_y } => {
                if !self.is_ready() || delta_y == 0.0 {
                    return Effect::None;
                }
                let factor = self.config.wheel_zoom_base.powf(delta_y);
                self.viewport.zoom_at(pos, factor);
                Effect::Redraw
            }
            EditorEvent::Key(key) => self.key(key),
            EditorEvent::SetMode(mode) => self.set_mode(mode),
            EditorEvent::SetLabel(label) => {
                self.active_label = label;
                Effect::Redraw
            }
            EditorEvent::RelabelSelected(label) => {
                if self.shapes.relabel_selected(label) {
                    Effect::Redraw
                } else {
                    Effect::None
                }
            }
            EditorEvent::FinishPolygon => match self.shapes.commit_draw(Mode::DrawPolygon) {
                Ok(_) => {
                    self.mode = Mode::Select;
                    Effect::Redraw
                }
                Err(err) => Effect::Rejected(err),
            },
            EditorEvent::ClearPolygon => {
                self.shapes.clear_polygon();
                Effect::Redraw
            }
            EditorEvent::ClearLine => {
                self.shapes.clear_line();
                Effect::Redraw
            }
            EditorEvent::DeleteSelected => self.delete_selected(),
            EditorEvent::ZoomIn => {
                self.viewport.zoom_centered(self.config.button_zoom_step);
                Effect::Redraw
            }
            EditorEvent::ZoomOut => {
                self.viewport.zoom_centered(1.0 / self.config.button_zoom_step);
                Effect::Redraw
            }
            EditorEvent::ResetView => {
                self.viewport.reset_to_fit();
                Effect::Redraw
            }
            EditorEvent::SetFlag(flag, value) => {
                self.flags.set(flag, value);
                Effect::Redraw
            }
            EditorEvent::Save => self.save(),
            EditorEvent::SaveFinished(result) => {
                self.saving = false;
                self.notice = Some(match result {
                    Ok(text) => Notice {
                        kind: NoticeKind::Success,
                        text,
                    },
                    Err(text) => Notice {
                        kind: NoticeKind::Error,
                        text,
                    },
                });
                Effect::Redraw
            }
            EditorEvent::DismissNotice => {
                self.notice = None;
                Effect::Redraw
            }
        }
    }

    fn load(&mut self, image: Size, annotations: Annotations) -> Effect {
        self.shapes = match annotations {
            Annotations::Boxes(boxes) => ShapeModel::with_boxes(self.config.min_box_size, boxes),
            Annotations::Crop(crop) => {
                self.flags = crop.flags();
                serialization::shapes_from_crop(&crop, self.config.min_box_size)
            }
        };
        self.image = Some(image);
        self.viewport.set_image(image);
        self.mode = self.kind.initial_mode();
        self.drag = None;
        self.status = SessionStatus::Ready;
        Effect::Redraw
    }

    /// Grab radius in image pixels at the current zoom.
    fn tolerance(&self) -> f64 {
        self.config.handle_radius / self.viewport.transform().scale
    }

    fn pointer_down(&mut self, pos: Point, button: PointerButton, modifiers: Modifiers) -> Effect {
        if modifiers.shift || button == PointerButton::Middle {
            self.drag = Some(Drag::Pan { last: pos });
            return Effect::None;
        }
        if button != PointerButton::Primary {
            return Effect::None;
        }
        let point = self.viewport.to_image(pos);
        match self.mode {
            Mode::Select => {
                if self.grab_shape(point) {
                    return Effect::Redraw;
                }
                let had_selection = self.shapes.deselect();
                self.drag = Some(Drag::Pan { last: pos });
                if had_selection {
                    Effect::Redraw
                } else {
                    Effect::None
                }
            }
            Mode::DrawBox => {
                if self.grab_box(point) {
                    return Effect::Redraw;
                }
                // A click on empty canvas with a selection only clears it
                if self.shapes.deselect() {
                    return Effect::Redraw;
                }
                self.shapes.begin_draw(Mode::DrawBox, point, self.active_label);
                self.drag = Some(Drag::DrawBox);
                Effect::Redraw
            }
            Mode::DrawPolygon => {
                self.shapes.begin_draw(Mode::DrawPolygon, point, self.active_label);
                Effect::Redraw
            }
            Mode::DrawLine => {
                if let DrawProgress::LineCompleted(_) =
                    self.shapes.begin_draw(Mode::DrawLine, point, self.active_label)
                {
                    self.mode = Mode::Select;
                }
                Effect::Redraw
            }
        }
    }

    /// Select a box under the point and start moving or resizing it.
    fn grab_box(&mut self, point: Point) -> bool {
        let tolerance = self.tolerance();
        if let Some(Selection::Box(index)) = self.shapes.selection() {
            if let Some(corner) = self.shapes.box_corner_at(index, &point, tolerance) {
                let anchor = corner.opposite().of(&self.shapes.boxes()[index]);
                self.drag = Some(Drag::ResizeBox { index, anchor });
                return true;
            }
        }
        if let Some(index) = self.shapes.box_at(&point) {
            self.shapes.select(Selection::Box(index));
            self.drag = Some(Drag::MoveBox { index, last: point });
            return true;
        }
        false
    }

    /// Hit-test every shape kind for select mode. Handles of the selected
    /// shape win over selecting something else.
    fn grab_shape(&mut self, point: Point) -> bool {
        let tolerance = self.tolerance();
        match self.shapes.selection() {
            Some(Selection::Line) => {
                if let Some(end) = self.shapes.line_end_at(&point, tolerance) {
                    self.drag = Some(Drag::LineEnd(end));
                    return true;
                }
            }
            Some(Selection::Polygon) => {
                if let Some(index) = self.shapes.polygon_vertex_at(&point, tolerance) {
                    self.drag = Some(Drag::PolygonVertex(index));
                    return true;
                }
            }
            _ => {}
        }
        if self.grab_box(point) {
            return true;
        }
        if self.shapes.line_near(&point, tolerance) {
            self.shapes.select(Selection::Line);
            return true;
        }
        if self.shapes.polygon_contains(&point) {
            self.shapes.select(Selection::Polygon);
            return true;
        }
        false
    }

    fn pointer_move(&mut self, pos: Point) -> Effect {
        let Some(drag) = self.drag else {
            return Effect::None;
        };
        let point = self.viewport.to_image(pos);
        match drag {
            Drag::Pan { last } => {
                self.viewport.pan_by(pos.x - last.x, pos.y - last.y);
                self.drag = Some(Drag::Pan { last: pos });
            }
            Drag::DrawBox => self.shapes.update_draw(Mode::DrawBox, point),
            Drag::MoveBox { index, last } => {
                self.shapes.move_box(index, point.x - last.x, point.y - last.y);
                self.drag = Some(Drag::MoveBox { index, last: point });
            }
            Drag::ResizeBox { index, anchor } => self.shapes.resize_box(index, anchor, point),
            Drag::PolygonVertex(index) => self.shapes.move_polygon_vertex(index, point),
            Drag::LineEnd(end) => self.shapes.move_line_end(end, point),
        }
        Effect::Redraw
    }

    fn pointer_up(&mut self, pos: Point) -> Effect {
        let Some(drag) = self.drag.take() else {
            return Effect::None;
        };
        if drag != Drag::DrawBox {
            return Effect::Redraw;
        }
        let point = self.viewport.to_image(pos);
        self.shapes.update_draw(Mode::DrawBox, point);
        match self.shapes.commit_draw(Mode::DrawBox) {
            Ok(Commit::BoxDiscarded) => {
                log::debug!("Discarded box below {} px", self.config.min_box_size);
                Effect::Redraw
            }
            Ok(_) => Effect::Redraw,
            Err(err) => Effect::Rejected(err),
        }
    }

    fn key(&mut self, key: EditorKey) -> Effect {
        match key {
            EditorKey::Delete | EditorKey::Backspace => self.delete_selected(),
            EditorKey::Escape => {
                self.drag = None;
                let cancelled = self.shapes.cancel_pending_box()
                    | self.shapes.cancel_pending_line()
                    | self.shapes.cancel_pending_polygon();
                if cancelled || self.shapes.deselect() {
                    Effect::Redraw
                } else {
                    Effect::None
                }
            }
            EditorKey::Digit(digit) => {
                if self.kind != EditorKind::Boxes {
                    return Effect::None;
                }
                match DefectLabel::from_shortcut(digit) {
                    Some(label) => {
                        self.active_label = label;
                        Effect::Redraw
                    }
                    None => Effect::None,
                }
            }
        }
    }

    fn set_mode(&mut self, mode: Mode) -> Effect {
        if !self.kind.modes().contains(&mode) || mode == self.mode {
            return Effect::None;
        }
        self.drag = None;
        self.shapes.cancel_pending_box();
        if self.mode == Mode::DrawLine {
            self.shapes.cancel_pending_line();
        }
        log::debug!("Editor mode {} -> {}", self.mode.name(), mode.name());
        self.mode = mode;
        Effect::Redraw
    }

    fn delete_selected(&mut self) -> Effect {
        if self.shapes.delete_selected() {
            self.drag = None;
            Effect::Redraw
        } else {
            Effect::None
        }
    }

    fn save(&mut self) -> Effect {
        if !self.is_ready() {
            return Effect::Rejected(EditorError::ImageNotLoaded);
        }
        if self.saving {
            return Effect::Rejected(EditorError::SaveInProgress);
        }
        if self.project.org_id.trim().is_empty() {
            return Effect::Rejected(EditorError::MissingIdentifier("orgId"));
        }
        if self.project.project_id.trim().is_empty() {
            return Effect::Rejected(EditorError::MissingIdentifier("projectId"));
        }
        let effect = match self.kind {
            EditorKind::Boxes => Effect::SaveBoxes(serialization::boxes_request(&self.shapes)),
            EditorKind::Crop => match serialization::crop_from_shapes(&self.shapes, self.flags) {
                Ok(crop) => Effect::SaveCrop(crop),
                Err(err) => return Effect::Rejected(err),
            },
        };
        self.saving = true;
        self.notice = None;
        effect
    }
}
