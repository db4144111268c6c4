// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor canvas.
//!
//! Paints the draw commands produced by [`render`] and translates raw
//! pointer input into editor events. Positions handed to the editor are
//! relative to the canvas' top-left corner (display space).

use crate::editor::interaction::{EditorEvent, EditorState, Modifiers, PointerButton};
use crate::editor::render::{render, DrawCommand, Rgba};
use crate::models::annotation::Point;
use crate::util::geometry::Size;

fn color(c: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3])
}

/// Display the canvas and collect the events it produced this frame.
pub fn show(
    ui: &mut egui::Ui,
    state: &EditorState,
    texture: Option<&egui::TextureHandle>,
) -> Vec<EditorEvent> {
    let mut events = Vec::new();

    let (rect, response) =
        ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
    let size = Size::new(rect.width() as f64, rect.height() as f64);
    if size != state.viewport.viewport_size() {
        events.push(EditorEvent::ViewportResized(size));
    }

    let to_local =
        |pos: egui::Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);
    let to_screen =
        |p: Point| egui::pos2(rect.min.x + p.x as f32, rect.min.y + p.y as f32);

    let (pressed, released, moved, latest, shift, scroll) = ui.input(|i| {
        let pressed = [
            (egui::PointerButton::Primary, PointerButton::Primary),
            (egui::PointerButton::Middle, PointerButton::Middle),
            (egui::PointerButton::Secondary, PointerButton::Secondary),
        ]
        .into_iter()
        .find(|(b, _)| i.pointer.button_pressed(*b))
        .map(|(_, ours)| ours);
        (
            pressed,
            i.pointer.any_released(),
            i.pointer.delta() != egui::Vec2::ZERO,
            i.pointer.latest_pos(),
            i.modifiers.shift,
            i.raw_scroll_delta.y,
        )
    });

    if let Some(pos) = latest {
        let local = to_local(pos);
        if let Some(button) = pressed {
            if response.hovered() {
                events.push(EditorEvent::PointerDown {
                    pos: local,
                    button,
                    modifiers: Modifiers { shift },
                });
            }
        } else if moved && state.drag.is_some() {
            events.push(EditorEvent::PointerMove { pos: local });
        }
        if released && (state.drag.is_some() || pressed.is_some()) {
            events.push(EditorEvent::PointerUp { pos: local });
        }
        if response.hovered() && scroll != 0.0 {
            // egui reports wheel-up as positive
            events.push(EditorEvent::Wheel {
                pos: local,
                delta_y: -scroll as f64,
            });
        }
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(40));

    let transform = state.viewport.transform();
    let handle_radius = state.config().handle_radius as f32;
    for command in render(state.image, &state.shapes, transform, handle_radius) {
        match command {
            DrawCommand::Image { min, max } => {
                if let Some(texture) = texture {
                    painter.image(
                        texture.id(),
                        egui::Rect::from_min_max(to_screen(min), to_screen(max)),
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }
            }
            DrawCommand::Rect { min, max, stroke, width, fill } => {
                painter.rect(
                    egui::Rect::from_two_pos(to_screen(min), to_screen(max)),
                    0.0,
                    fill.map(color).unwrap_or(egui::Color32::TRANSPARENT),
                    egui::Stroke::new(width, color(stroke)),
                );
            }
            DrawCommand::Path { points, closed, stroke, width, fill } => {
                let points: Vec<egui::Pos2> = points.into_iter().map(to_screen).collect();
                let stroke = egui::Stroke::new(width, color(stroke));
                if closed {
                    if let Some(fill) = fill {
                        // Fill tessellation assumes a roughly convex region
                        painter.add(egui::Shape::convex_polygon(
                            points.clone(),
                            color(fill),
                            egui::Stroke::NONE,
                        ));
                    }
                    painter.add(egui::Shape::closed_line(points, stroke));
                } else {
                    painter.add(egui::Shape::line(points, stroke));
                }
            }
            DrawCommand::Handle { center, radius, fill, outline } => {
                let center = to_screen(center);
                painter.circle_filled(center, radius, color(fill));
                painter.circle_stroke(center, radius, egui::Stroke::new(1.5, color(outline)));
            }
            DrawCommand::Text { pos, text, color: c } => {
                painter.text(
                    to_screen(pos) - egui::vec2(0.0, 2.0),
                    egui::Align2::LEFT_BOTTOM,
                    text,
                    egui::FontId::proportional(12.0),
                    color(c),
                );
            }
        }
    }

    if state.is_panning() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
    } else if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
    }

    events
}
