// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor toolbar: tools, view controls and save.

use crate::editor::interaction::{EditorEvent, EditorState, NoticeKind};
use crate::editor::Mode;

/// Result of toolbar interaction.
pub enum ToolbarAction {
    None,
    Back,
    Editor(EditorEvent),
}

fn mode_icon(mode: Mode) -> &'static str {
    match mode {
        Mode::Select => "⬆",
        Mode::DrawBox => "▭",
        Mode::DrawPolygon => "▱",
        Mode::DrawLine => "⟋",
    }
}

/// Display the toolbar and the notice row below it.
pub fn show(ui: &mut egui::Ui, state: &EditorState, title: &str) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.button("⬅ Pipeline").clicked() {
            action = ToolbarAction::Back;
        }
        ui.separator();
        ui.strong(title);
        ui.separator();

        for &mode in state.kind.modes() {
            let text = format!("{} {}", mode_icon(mode), mode.name());
            if ui.selectable_label(state.mode == mode, text).clicked() {
                action = ToolbarAction::Editor(EditorEvent::SetMode(mode));
            }
        }

        ui.separator();

        if ui.button("➕").on_hover_text("Zoom in").clicked() {
            action = ToolbarAction::Editor(EditorEvent::ZoomIn);
        }
        if ui.button("➖").on_hover_text("Zoom out").clicked() {
            action = ToolbarAction::Editor(EditorEvent::ZoomOut);
        }
        if ui.button("Reset View").clicked() {
            action = ToolbarAction::Editor(EditorEvent::ResetView);
        }

        ui.separator();

        let label = if state.saving { "Saving..." } else { "💾 Save (Ctrl+S)" };
        let enabled = state.is_ready() && !state.saving;
        if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
            action = ToolbarAction::Editor(EditorEvent::Save);
        }
        if state.saving {
            ui.spinner();
        }
    });

    if let Some(notice) = &state.notice {
        let tint = match notice.kind {
            NoticeKind::Success => egui::Color32::from_rgb(0x22, 0xc5, 0x5e),
            NoticeKind::Error => egui::Color32::from_rgb(0xef, 0x44, 0x44),
        };
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&notice.text).color(tint));
            if ui.small_button("✖").clicked() {
                action = ToolbarAction::Editor(EditorEvent::DismissNotice);
            }
        });
    }

    action
}
