// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor side panel.
//!
//! Label picker for the box editor; polygon, rotation line and mounting
//! flag controls for the crop editor.

use crate::editor::interaction::{EditorEvent, EditorState};
use crate::editor::shapes::Selection;
use crate::editor::EditorKind;
use crate::models::annotation::{CropFlag, DefectLabel};

/// Display the panel for the current editor.
pub fn show(ui: &mut egui::Ui, state: &EditorState) -> Option<EditorEvent> {
    let mut event = None;
    egui::ScrollArea::vertical().show(ui, |ui| {
        match state.kind {
            EditorKind::Boxes => box_panel(ui, state, &mut event),
            EditorKind::Crop => crop_panel(ui, state, &mut event),
        }

        ui.separator();
        let has_selection = state.shapes.selection().is_some();
        if ui
            .add_enabled(has_selection, egui::Button::new("🗑 Delete Selected"))
            .clicked()
        {
            event = Some(EditorEvent::DeleteSelected);
        }
    });
    event
}

fn swatch(ui: &mut egui::Ui, label: DefectLabel) {
    let [r, g, b] = label.color();
    let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 2.0, egui::Color32::from_rgb(r, g, b));
}

fn box_panel(ui: &mut egui::Ui, state: &EditorState, event: &mut Option<EditorEvent>) {
    ui.heading("Labels");
    ui.add_space(4.0);

    for (i, label) in DefectLabel::ALL.into_iter().enumerate() {
        let count = state.shapes.boxes().iter().filter(|b| b.label == label).count();
        ui.horizontal(|ui| {
            swatch(ui, label);
            let text = format!("{} {} ({})", i + 1, label.name(), count);
            if ui.selectable_label(state.active_label == label, text).clicked() {
                *event = Some(EditorEvent::SetLabel(label));
            }
        });
    }

    ui.add_space(8.0);
    let box_selected = matches!(state.shapes.selection(), Some(Selection::Box(_)));
    if ui
        .add_enabled(box_selected, egui::Button::new("Apply label to selected"))
        .clicked()
    {
        *event = Some(EditorEvent::RelabelSelected(state.active_label));
    }

    ui.separator();
    ui.label(format!("{} boxes", state.shapes.boxes().len()));
    if let Some(Selection::Box(index)) = state.shapes.selection() {
        if let Some(b) = state.shapes.boxes().get(index) {
            ui.label(
                egui::RichText::new(format!(
                    "Selected: {} at ({:.0}, {:.0}) {:.0}×{:.0}",
                    b.label.name(),
                    b.left,
                    b.top,
                    b.width,
                    b.height
                ))
                .weak(),
            );
        }
    }
}

fn crop_panel(ui: &mut egui::Ui, state: &EditorState, event: &mut Option<EditorEvent>) {
    ui.heading("Crop Region");
    ui.add_space(4.0);

    let pending = state.shapes.pending_polygon().len();
    match state.shapes.polygon() {
        Some(points) => ui.label(format!("Polygon: {} points", points.len())),
        None => ui.label(format!("Polygon: {} pending points", pending)),
    };
    ui.horizontal(|ui| {
        if ui
            .add_enabled(pending > 0, egui::Button::new("Finish Polygon"))
            .clicked()
        {
            *event = Some(EditorEvent::FinishPolygon);
        }
        if ui.button("Clear Polygon").clicked() {
            *event = Some(EditorEvent::ClearPolygon);
        }
    });

    ui.separator();
    ui.heading("Rotation Line");
    match state.shapes.line() {
        Some(line) => {
            let angle = (line.end.y - line.start.y)
                .atan2(line.end.x - line.start.x)
                .to_degrees();
            ui.label(format!("Angle: {:.1}°", angle));
        }
        None if state.shapes.pending_line_start().is_some() => {
            ui.label("Click the end point");
        }
        None => {
            ui.label("Not set");
        }
    }
    if ui.button("Clear Line").clicked() {
        *event = Some(EditorEvent::ClearLine);
    }

    ui.separator();
    ui.heading("Panel Layout");
    for flag in CropFlag::ALL {
        let mut value = state.flags.get(flag);
        if ui.checkbox(&mut value, flag.name()).changed() {
            *event = Some(EditorEvent::SetFlag(flag, value));
        }
    }
}
