// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Shape model for the annotation editors.
//!
//! Holds the persisted shapes (boxes, at most one polygon, at most one
//! rotation line), the transient shape being drawn, and the selection.
//! Everything here is in image space; the model never sees the view
//! transform.

use super::Mode;
use crate::error::EditorError;
use crate::models::annotation::{BoundingBox, DefectLabel, Point, RotationLine};
use crate::util::geometry::{distance_to_segment, point_in_polygon};

/// Minimum number of vertices of a persistable polygon.
pub const MIN_POLYGON_POINTS: usize = 3;

/// The shape currently selected. Only one can be selected at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Box(usize),
    Polygon,
    Line,
}

/// Box being dragged out. `rect` is kept normalized on every update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingBox {
    pub start: Point,
    pub rect: BoundingBox,
}

/// Corner of a box, in [`BoundingBox::corners`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// The corner diagonally across, which stays fixed while this one is dragged.
    pub fn opposite(&self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomRight => Corner::TopLeft,
            Corner::BottomLeft => Corner::TopRight,
        }
    }

    fn index(&self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }

    pub fn of(&self, rect: &BoundingBox) -> Point {
        rect.corners()[self.index()]
    }
}

/// End of the rotation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    Start,
    End,
}

/// Result of [`ShapeModel::begin_draw`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawProgress {
    BoxStarted,
    VertexAdded(usize),
    LineStarted,
    /// Second click of a line; the caller returns to select mode.
    LineCompleted(RotationLine),
    Ignored,
}

/// Result of [`ShapeModel::commit_draw`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commit {
    BoxAdded(usize),
    /// Drag was smaller than the minimum size in some dimension.
    BoxDiscarded,
    PolygonFinished(usize),
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeModel {
    boxes: Vec<BoundingBox>,
    polygon: Option<Vec<Point>>,
    line: Option<RotationLine>,
    pending_box: Option<PendingBox>,
    pending_polygon: Vec<Point>,
    pending_line_start: Option<Point>,
    selection: Option<Selection>,
    min_box_size: f64,
}

impl ShapeModel {
    pub fn new(min_box_size: f64) -> Self {
        Self {
            boxes: Vec::new(),
            polygon: None,
            line: None,
            pending_box: None,
            pending_polygon: Vec::new(),
            pending_line_start: None,
            selection: None,
            min_box_size,
        }
    }

    /// Model holding previously saved boxes. Extents are normalized.
    pub fn with_boxes(min_box_size: f64, boxes: Vec<BoundingBox>) -> Self {
        let mut model = Self::new(min_box_size);
        model.boxes = boxes
            .into_iter()
            .map(|b| {
                BoundingBox::from_corners(
                    Point::new(b.left, b.top),
                    Point::new(b.left + b.width, b.top + b.height),
                    b.label,
                )
            })
            .collect();
        model
    }

    /// Model holding a previously saved crop polygon and rotation line.
    ///
    /// A stored polygon with fewer than three points is not persistable, so
    /// its points come back as pending vertices the user can extend.
    pub fn with_crop(min_box_size: f64, polygon: Vec<Point>, line: Option<RotationLine>) -> Self {
        let mut model = Self::new(min_box_size);
        if polygon.len() >= MIN_POLYGON_POINTS {
            model.polygon = Some(polygon);
        } else {
            model.pending_polygon = polygon;
        }
        model.line = line;
        model
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn polygon(&self) -> Option<&[Point]> {
        self.polygon.as_deref()
    }

    pub fn line(&self) -> Option<&RotationLine> {
        self.line.as_ref()
    }

    pub fn pending_box(&self) -> Option<&PendingBox> {
        self.pending_box.as_ref()
    }

    pub fn pending_polygon(&self) -> &[Point] {
        &self.pending_polygon
    }

    pub fn pending_line_start(&self) -> Option<Point> {
        self.pending_line_start
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Start or extend a drawing in the given mode.
    ///
    /// Box mode opens a zero-extent box at `point`. Polygon mode appends a
    /// vertex to the pending list. Line mode records the start point, or
    /// completes the line if a start point is already set.
    pub fn begin_draw(&mut self, mode: Mode, point: Point, label: DefectLabel) -> DrawProgress {
        match mode {
            Mode::DrawBox => {
                self.pending_box = Some(PendingBox {
                    start: point,
                    rect: BoundingBox::new(point.x, point.y, 0.0, 0.0, label),
                });
                DrawProgress::BoxStarted
            }
            Mode::DrawPolygon => {
                self.pending_polygon.push(point);
                DrawProgress::VertexAdded(self.pending_polygon.len())
            }
            Mode::DrawLine => match self.pending_line_start.take() {
                None => {
                    self.pending_line_start = Some(point);
                    DrawProgress::LineStarted
                }
                Some(start) => {
                    let line = RotationLine { start, end: point };
                    self.line = Some(line);
                    if self.selection == Some(Selection::Line) {
                        self.selection = None;
                    }
                    DrawProgress::LineCompleted(line)
                }
            },
            Mode::Select => DrawProgress::Ignored,
        }
    }

    /// Track the pointer while dragging out a box. Other modes ignore it.
    pub fn update_draw(&mut self, mode: Mode, current: Point) {
        if mode != Mode::DrawBox {
            return;
        }
        if let Some(pending) = self.pending_box.as_mut() {
            pending.rect = BoundingBox::from_corners(pending.start, current, pending.rect.label);
        }
    }

    /// Finish the drawing of the given mode.
    ///
    /// Boxes below the minimum size in either dimension are dropped as
    /// accidental clicks. Polygons need [`MIN_POLYGON_POINTS`] vertices;
    /// with fewer the pending vertices are kept and an error is returned.
    pub fn commit_draw(&mut self, mode: Mode) -> Result<Commit, EditorError> {
        match mode {
            Mode::DrawBox => {
                let Some(pending) = self.pending_box.take() else {
                    return Ok(Commit::Nothing);
                };
                let rect = pending.rect;
                if rect.width < self.min_box_size || rect.height < self.min_box_size {
                    return Ok(Commit::BoxDiscarded);
                }
                self.boxes.push(rect);
                Ok(Commit::BoxAdded(self.boxes.len() - 1))
            }
            Mode::DrawPolygon => {
                let count = self.pending_polygon.len();
                if count < MIN_POLYGON_POINTS {
                    return Err(EditorError::TooFewPolygonPoints { count });
                }
                self.polygon = Some(std::mem::take(&mut self.pending_polygon));
                Ok(Commit::PolygonFinished(count))
            }
            Mode::DrawLine | Mode::Select => Ok(Commit::Nothing),
        }
    }

    /// Drop a box drag that has not been committed.
    pub fn cancel_pending_box(&mut self) -> bool {
        self.pending_box.take().is_some()
    }

    /// Drop a half-drawn line.
    pub fn cancel_pending_line(&mut self) -> bool {
        self.pending_line_start.take().is_some()
    }

    /// Drop unfinished polygon vertices, keeping any committed polygon.
    pub fn cancel_pending_polygon(&mut self) -> bool {
        let had = !self.pending_polygon.is_empty();
        self.pending_polygon.clear();
        had
    }

    pub fn select(&mut self, selection: Selection) {
        let valid = match selection {
            Selection::Box(i) => i < self.boxes.len(),
            Selection::Polygon => self.polygon.is_some(),
            Selection::Line => self.line.is_some(),
        };
        if valid {
            self.selection = Some(selection);
        }
    }

    pub fn deselect(&mut self) -> bool {
        self.selection.take().is_some()
    }

    /// Remove whatever is selected. Returns `false` if nothing was.
    pub fn delete_selected(&mut self) -> bool {
        match self.selection.take() {
            Some(Selection::Box(i)) if i < self.boxes.len() => {
                self.boxes.remove(i);
                true
            }
            Some(Selection::Polygon) => {
                self.polygon = None;
                true
            }
            Some(Selection::Line) => {
                self.line = None;
                true
            }
            _ => false,
        }
    }

    /// Remove the polygon and every pending vertex.
    pub fn clear_polygon(&mut self) {
        self.polygon = None;
        self.pending_polygon.clear();
        if self.selection == Some(Selection::Polygon) {
            self.selection = None;
        }
    }

    /// Remove the rotation line and any half-drawn one.
    pub fn clear_line(&mut self) {
        self.line = None;
        self.pending_line_start = None;
        if self.selection == Some(Selection::Line) {
            self.selection = None;
        }
    }

    /// Change the label of the selected box. No-op unless a box is selected.
    pub fn relabel_selected(&mut self, label: DefectLabel) -> bool {
        match self.selection {
            Some(Selection::Box(i)) => match self.boxes.get_mut(i) {
                Some(b) => {
                    b.label = label;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Topmost box containing the point.
    pub fn box_at(&self, point: &Point) -> Option<usize> {
        self.boxes.iter().rposition(|b| b.contains(point))
    }

    /// Corner handle of box `index` within `tolerance` of the point.
    pub fn box_corner_at(&self, index: usize, point: &Point, tolerance: f64) -> Option<Corner> {
        let rect = self.boxes.get(index)?;
        Corner::ALL
            .into_iter()
            .find(|c| c.of(rect).distance_to(point) <= tolerance)
    }

    /// Translate box `index` by an image-space delta.
    pub fn move_box(&mut self, index: usize, dx: f64, dy: f64) {
        if let Some(b) = self.boxes.get_mut(index) {
            b.left += dx;
            b.top += dy;
        }
    }

    /// Resize box `index` so it spans `anchor` and `current`, normalized.
    pub fn resize_box(&mut self, index: usize, anchor: Point, current: Point) {
        if let Some(b) = self.boxes.get_mut(index) {
            *b = BoundingBox::from_corners(anchor, current, b.label);
        }
    }

    pub fn polygon_contains(&self, point: &Point) -> bool {
        self.polygon
            .as_deref()
            .is_some_and(|poly| point_in_polygon(point, poly))
    }

    /// Vertex of the polygon within `tolerance` of the point.
    pub fn polygon_vertex_at(&self, point: &Point, tolerance: f64) -> Option<usize> {
        self.polygon
            .as_deref()?
            .iter()
            .position(|v| v.distance_to(point) <= tolerance)
    }

    pub fn move_polygon_vertex(&mut self, index: usize, point: Point) {
        if let Some(v) = self.polygon.as_mut().and_then(|poly| poly.get_mut(index)) {
            *v = point;
        }
    }

    pub fn line_near(&self, point: &Point, tolerance: f64) -> bool {
        self.line
            .is_some_and(|l| distance_to_segment(point, &l.start, &l.end) <= tolerance)
    }

    /// Line endpoint within `tolerance` of the point.
    pub fn line_end_at(&self, point: &Point, tolerance: f64) -> Option<LineEnd> {
        let line = self.line?;
        if line.start.distance_to(point) <= tolerance {
            Some(LineEnd::Start)
        } else if line.end.distance_to(point) <= tolerance {
            Some(LineEnd::End)
        } else {
            None
        }
    }

    pub fn move_line_end(&mut self, end: LineEnd, point: Point) {
        if let Some(line) = self.line.as_mut() {
            match end {
                LineEnd::Start => line.start = point,
                LineEnd::End => line.end = point,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag_box(model: &mut ShapeModel, from: Point, to: Point) -> Commit {
        model.begin_draw(Mode::DrawBox, from, DefectLabel::Hotspots);
        model.update_draw(Mode::DrawBox, to);
        model.commit_draw(Mode::DrawBox).unwrap()
    }

    #[test]
    fn test_box_drag_is_normalized() {
        let cases = [
            (Point::new(10.0, 20.0), Point::new(110.0, 70.0)),
            (Point::new(110.0, 70.0), Point::new(10.0, 20.0)),
            (Point::new(110.0, 20.0), Point::new(10.0, 70.0)),
            (Point::new(10.0, 70.0), Point::new(110.0, 20.0)),
        ];
        for (start, end) in cases {
            let mut model = ShapeModel::new(10.0);
            assert_eq!(drag_box(&mut model, start, end), Commit::BoxAdded(0));
            let b = model.boxes()[0];
            assert_eq!(b.left, start.x.min(end.x));
            assert_eq!(b.top, start.y.min(end.y));
            assert_eq!(b.width, (end.x - start.x).abs());
            assert_eq!(b.height, (end.y - start.y).abs());
            assert_eq!(b.label, DefectLabel::Hotspots);
        }
    }

    #[test]
    fn test_pending_box_normalized_while_dragging() {
        let mut model = ShapeModel::new(10.0);
        model.begin_draw(Mode::DrawBox, Point::new(50.0, 50.0), DefectLabel::DefaultPanel);
        model.update_draw(Mode::DrawBox, Point::new(20.0, 30.0));
        let rect = model.pending_box().unwrap().rect;
        assert_eq!((rect.left, rect.top, rect.width, rect.height), (20.0, 30.0, 30.0, 20.0));
        assert!(model.boxes().is_empty());
    }

    #[test]
    fn test_small_boxes_are_discarded() {
        let mut model = ShapeModel::new(10.0);
        let commit = drag_box(&mut model, Point::new(0.0, 0.0), Point::new(4.0, 6.0));
        assert_eq!(commit, Commit::BoxDiscarded);

        // One thin dimension is enough to discard
        let commit = drag_box(&mut model, Point::new(0.0, 0.0), Point::new(200.0, 5.0));
        assert_eq!(commit, Commit::BoxDiscarded);
        assert!(model.boxes().is_empty());
        assert!(model.pending_box().is_none());

        let mut lenient = ShapeModel::new(1.0);
        let commit = drag_box(&mut lenient, Point::new(0.0, 0.0), Point::new(4.0, 6.0));
        assert_eq!(commit, Commit::BoxAdded(0));
    }

    #[test]
    fn test_polygon_commit_gate() {
        let mut model = ShapeModel::new(10.0);
        model.begin_draw(Mode::DrawPolygon, Point::new(0.0, 0.0), DefectLabel::default());
        model.begin_draw(Mode::DrawPolygon, Point::new(10.0, 0.0), DefectLabel::default());
        assert_eq!(
            model.commit_draw(Mode::DrawPolygon),
            Err(EditorError::TooFewPolygonPoints { count: 2 })
        );
        assert!(model.polygon().is_none());
        assert_eq!(model.pending_polygon().len(), 2);

        model.begin_draw(Mode::DrawPolygon, Point::new(10.0, 10.0), DefectLabel::default());
        assert_eq!(model.commit_draw(Mode::DrawPolygon), Ok(Commit::PolygonFinished(3)));
        assert_eq!(
            model.polygon().unwrap(),
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]
        );
        assert!(model.pending_polygon().is_empty());
    }

    #[test]
    fn test_line_completes_on_second_point() {
        let mut model = ShapeModel::new(10.0);
        assert_eq!(
            model.begin_draw(Mode::DrawLine, Point::new(5.0, 5.0), DefectLabel::default()),
            DrawProgress::LineStarted
        );
        assert!(model.line().is_none());
        let progress =
            model.begin_draw(Mode::DrawLine, Point::new(50.0, 60.0), DefectLabel::default());
        let expected = RotationLine {
            start: Point::new(5.0, 5.0),
            end: Point::new(50.0, 60.0),
        };
        assert_eq!(progress, DrawProgress::LineCompleted(expected));
        assert_eq!(model.line(), Some(&expected));
        assert!(model.pending_line_start().is_none());
        assert_eq!(model.commit_draw(Mode::DrawLine), Ok(Commit::Nothing));
    }

    #[test]
    fn test_delete_and_relabel_selected_box() {
        let mut model = ShapeModel::with_boxes(
            10.0,
            vec![
                BoundingBox::new(0.0, 0.0, 20.0, 20.0, DefectLabel::DefaultPanel),
                BoundingBox::new(50.0, 50.0, 20.0, 20.0, DefectLabel::DefaultPanel),
            ],
        );
        assert!(!model.relabel_selected(DefectLabel::Hotspots));

        model.select(Selection::Box(1));
        assert!(model.relabel_selected(DefectLabel::Hotspots));
        assert_eq!(model.boxes()[1].label, DefectLabel::Hotspots);

        assert!(model.delete_selected());
        assert_eq!(model.boxes().len(), 1);
        assert!(model.selection().is_none());
        assert!(!model.delete_selected());
    }

    #[test]
    fn test_select_rejects_missing_shapes() {
        let mut model = ShapeModel::new(10.0);
        model.select(Selection::Box(0));
        model.select(Selection::Polygon);
        model.select(Selection::Line);
        assert!(model.selection().is_none());
    }

    #[test]
    fn test_clear_polygon_and_line() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let line = RotationLine {
            start: Point::new(0.0, 0.0),
            end: Point::new(5.0, 5.0),
        };
        let mut model = ShapeModel::with_crop(10.0, square, Some(line));
        model.begin_draw(Mode::DrawPolygon, Point::new(3.0, 3.0), DefectLabel::default());
        model.select(Selection::Polygon);

        model.clear_polygon();
        assert!(model.polygon().is_none());
        assert!(model.pending_polygon().is_empty());
        assert!(model.selection().is_none());

        model.begin_draw(Mode::DrawLine, Point::new(1.0, 1.0), DefectLabel::default());
        model.clear_line();
        assert!(model.line().is_none());
        assert!(model.pending_line_start().is_none());
    }

    #[test]
    fn test_short_stored_polygon_loads_as_pending() {
        let model =
            ShapeModel::with_crop(10.0, vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)], None);
        assert!(model.polygon().is_none());
        assert_eq!(model.pending_polygon().len(), 2);
    }

    #[test]
    fn test_box_hit_editing() {
        let mut model = ShapeModel::with_boxes(
            10.0,
            vec![
                BoundingBox::new(0.0, 0.0, 100.0, 100.0, DefectLabel::DefaultPanel),
                BoundingBox::new(50.0, 50.0, 100.0, 100.0, DefectLabel::Hotspots),
            ],
        );
        // Overlap resolves to the box drawn last
        assert_eq!(model.box_at(&Point::new(75.0, 75.0)), Some(1));
        assert_eq!(model.box_at(&Point::new(10.0, 10.0)), Some(0));
        assert_eq!(model.box_at(&Point::new(500.0, 10.0)), None);

        model.move_box(0, 5.0, -5.0);
        assert_eq!((model.boxes()[0].left, model.boxes()[0].top), (5.0, -5.0));

        let corner = model.box_corner_at(1, &Point::new(151.0, 149.0), 3.0);
        assert_eq!(corner, Some(Corner::BottomRight));
        let anchor = Corner::BottomRight.opposite().of(&model.boxes()[1]);
        // Dragging past the anchor flips the box but keeps the extent positive
        model.resize_box(1, anchor, Point::new(20.0, 30.0));
        let b = model.boxes()[1];
        assert_eq!((b.left, b.top, b.width, b.height), (20.0, 30.0, 30.0, 20.0));
    }

    #[test]
    fn test_crop_hit_editing() {
        let tri = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(0.0, 100.0)];
        let line = RotationLine {
            start: Point::new(200.0, 0.0),
            end: Point::new(200.0, 100.0),
        };
        let mut model = ShapeModel::with_crop(10.0, tri, Some(line));

        assert!(model.polygon_contains(&Point::new(10.0, 10.0)));
        assert!(!model.polygon_contains(&Point::new(90.0, 90.0)));
        assert_eq!(model.polygon_vertex_at(&Point::new(99.0, 1.0), 2.0), Some(1));
        model.move_polygon_vertex(1, Point::new(120.0, 0.0));
        assert_eq!(model.polygon().unwrap()[1], Point::new(120.0, 0.0));

        assert!(model.line_near(&Point::new(202.0, 50.0), 3.0));
        assert!(!model.line_near(&Point::new(210.0, 50.0), 3.0));
        assert_eq!(model.line_end_at(&Point::new(200.0, 99.0), 2.0), Some(LineEnd::End));
        model.move_line_end(LineEnd::Start, Point::new(190.0, 0.0));
        assert_eq!(model.line().unwrap().start, Point::new(190.0, 0.0));
    }
}
