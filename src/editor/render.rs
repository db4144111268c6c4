// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene rendering.
//!
//! [`render`] turns the background image size, the shape model and the
//! current transform into display-space draw commands. The canvas widget
//! only paints what it gets back.

use super::shapes::{Selection, ShapeModel};
use crate::models::annotation::{BoundingBox, Point};
use crate::util::geometry::{to_display_space, Size, Transform};

/// RGBA, not premultiplied.
pub type Rgba = [u8; 4];

pub const POLYGON_COLOR: Rgba = [0x3b, 0x82, 0xf6, 0xff];
pub const PENDING_COLOR: Rgba = [0xfb, 0xbf, 0x24, 0xff];
pub const LINE_COLOR: Rgba = [0xef, 0x44, 0x44, 0xff];
const HANDLE_FILL: Rgba = [0xff, 0xff, 0xff, 0xff];

fn with_alpha(color: Rgba, alpha: u8) -> Rgba {
    [color[0], color[1], color[2], alpha]
}

fn label_rgba(rect: &BoundingBox) -> Rgba {
    let [r, g, b] = rect.label.color();
    [r, g, b, 0xff]
}

/// One primitive, in display-space coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Image {
        min: Point,
        max: Point,
    },
    Rect {
        min: Point,
        max: Point,
        stroke: Rgba,
        width: f32,
        fill: Option<Rgba>,
    },
    /// Closed paths get their last-to-first edge drawn; it is never stored.
    Path {
        points: Vec<Point>,
        closed: bool,
        stroke: Rgba,
        width: f32,
        fill: Option<Rgba>,
    },
    Handle {
        center: Point,
        radius: f32,
        fill: Rgba,
        outline: Rgba,
    },
    Text {
        pos: Point,
        text: String,
        color: Rgba,
    },
}

/// Draw commands for a frame, back to front.
pub fn render(
    image: Option<Size>,
    shapes: &ShapeModel,
    transform: &Transform,
    handle_radius: f32,
) -> Vec<DrawCommand> {
    let mut out = Vec::new();
    let display = |p: Point| to_display_space(p, transform);

    if let Some(size) = image {
        out.push(DrawCommand::Image {
            min: display(Point::new(0.0, 0.0)),
            max: display(Point::new(size.width, size.height)),
        });
    }

    let selection = shapes.selection();

    for (index, rect) in shapes.boxes().iter().enumerate() {
        let color = label_rgba(rect);
        let selected = selection == Some(Selection::Box(index));
        out.push(DrawCommand::Rect {
            min: display(Point::new(rect.left, rect.top)),
            max: display(Point::new(rect.right(), rect.bottom())),
            stroke: color,
            width: if selected { 3.0 } else { 2.0 },
            fill: selected.then(|| with_alpha(color, 0x30)),
        });
        out.push(DrawCommand::Text {
            pos: display(Point::new(rect.left, rect.top)),
            text: rect.label.name().to_string(),
            color,
        });
        if selected {
            for corner in rect.corners() {
                out.push(DrawCommand::Handle {
                    center: display(corner),
                    radius: handle_radius * 0.75,
                    fill: HANDLE_FILL,
                    outline: color,
                });
            }
        }
    }

    if let Some(pending) = shapes.pending_box() {
        let color = label_rgba(&pending.rect);
        out.push(DrawCommand::Rect {
            min: display(Point::new(pending.rect.left, pending.rect.top)),
            max: display(Point::new(pending.rect.right(), pending.rect.bottom())),
            stroke: color,
            width: 1.5,
            fill: Some(with_alpha(color, 0x20)),
        });
    }

    if let Some(polygon) = shapes.polygon() {
        let selected = selection == Some(Selection::Polygon);
        out.push(DrawCommand::Path {
            points: polygon.iter().copied().map(display).collect(),
            closed: true,
            stroke: POLYGON_COLOR,
            width: if selected { 3.0 } else { 2.0 },
            fill: Some(with_alpha(POLYGON_COLOR, 0x33)),
        });
        if selected {
            for vertex in polygon {
                out.push(DrawCommand::Handle {
                    center: display(*vertex),
                    radius: handle_radius * 0.75,
                    fill: HANDLE_FILL,
                    outline: POLYGON_COLOR,
                });
            }
        }
    }

    let pending = shapes.pending_polygon();
    if pending.len() > 1 {
        out.push(DrawCommand::Path {
            points: pending.iter().copied().map(display).collect(),
            closed: false,
            stroke: PENDING_COLOR,
            width: 2.0,
            fill: None,
        });
    }
    for vertex in pending {
        out.push(DrawCommand::Handle {
            center: display(*vertex),
            radius: handle_radius * 0.6,
            fill: PENDING_COLOR,
            outline: PENDING_COLOR,
        });
    }

    if let Some(line) = shapes.line() {
        out.push(DrawCommand::Path {
            points: vec![display(line.start), display(line.end)],
            closed: false,
            stroke: LINE_COLOR,
            width: 3.0,
            fill: None,
        });
        if selection == Some(Selection::Line) {
            for end in [line.start, line.end] {
                out.push(DrawCommand::Handle {
                    center: display(end),
                    radius: handle_radius * 0.75,
                    fill: HANDLE_FILL,
                    outline: LINE_COLOR,
                });
            }
        }
    }

    if let Some(start) = shapes.pending_line_start() {
        out.push(DrawCommand::Handle {
            center: display(start),
            radius: handle_radius * 0.6,
            fill: LINE_COLOR,
            outline: LINE_COLOR,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Mode;
    use crate::models::annotation::{DefectLabel, RotationLine};

    fn zoomed() -> Transform {
        Transform {
            scale: 2.0,
            offset_x: 10.0,
            offset_y: 20.0,
        }
    }

    #[test]
    fn test_image_layer_comes_first() {
        let shapes = ShapeModel::new(10.0);
        let cmds = render(Some(Size::new(100.0, 50.0)), &shapes, &zoomed(), 8.0);
        assert_eq!(
            cmds,
            vec![DrawCommand::Image {
                min: Point::new(10.0, 20.0),
                max: Point::new(210.0, 120.0),
            }]
        );
        assert!(render(None, &shapes, &zoomed(), 8.0).is_empty());
    }

    #[test]
    fn test_boxes_follow_transform() {
        let shapes = ShapeModel::with_boxes(
            10.0,
            vec![BoundingBox::new(5.0, 5.0, 20.0, 10.0, DefectLabel::FaultyDiodes)],
        );
        let cmds = render(None, &shapes, &zoomed(), 8.0);
        match &cmds[0] {
            DrawCommand::Rect { min, max, stroke, fill, .. } => {
                assert_eq!(*min, Point::new(20.0, 30.0));
                assert_eq!(*max, Point::new(60.0, 50.0));
                assert_eq!(*stroke, [0xf9, 0x73, 0x16, 0xff]);
                assert!(fill.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_selected_box_gets_handles() {
        let mut shapes = ShapeModel::with_boxes(
            10.0,
            vec![BoundingBox::new(0.0, 0.0, 20.0, 20.0, DefectLabel::Hotspots)],
        );
        shapes.select(Selection::Box(0));
        let cmds = render(None, &shapes, &Transform::default(), 8.0);
        let handles = cmds
            .iter()
            .filter(|c| matches!(c, DrawCommand::Handle { .. }))
            .count();
        assert_eq!(handles, 4);
    }

    #[test]
    fn test_polygon_is_closed_and_pending_is_open() {
        let tri = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)];
        let mut shapes = ShapeModel::with_crop(10.0, tri, None);
        shapes.begin_draw(Mode::DrawPolygon, Point::new(50.0, 50.0), DefectLabel::default());
        shapes.begin_draw(Mode::DrawPolygon, Point::new(60.0, 50.0), DefectLabel::default());

        let paths: Vec<_> = render(None, &shapes, &Transform::default(), 8.0)
            .into_iter()
            .filter_map(|c| match c {
                DrawCommand::Path {
                    points,
                    closed,
                    stroke,
                    ..
                } => Some((points.len(), closed, stroke)),
                _ => None,
            })
            .collect();
        assert_eq!(paths, vec![(3, true, POLYGON_COLOR), (2, false, PENDING_COLOR)]);
    }

    #[test]
    fn test_rotation_line_is_red() {
        let line = RotationLine {
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 10.0),
        };
        let shapes = ShapeModel::with_crop(10.0, Vec::new(), Some(line));
        let cmds = render(None, &shapes, &zoomed(), 8.0);
        assert_eq!(
            cmds,
            vec![DrawCommand::Path {
                points: vec![Point::new(10.0, 20.0), Point::new(30.0, 40.0)],
                closed: false,
                stroke: LINE_COLOR,
                width: 3.0,
                fill: None,
            }]
        );
    }
}
