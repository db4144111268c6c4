// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pipeline view of one project.

use crate::models::project::{pipeline_stages, ProjectRef, ProjectStatus, StageAction};

pub enum PipelineAction {
    None,
    Back,
    Refresh,
    Stage(StageAction),
}

/// Message from the last action, shown under the stages.
pub struct ActionMessage {
    pub ok: bool,
    pub text: String,
}

pub fn show(
    ui: &mut egui::Ui,
    project: &ProjectRef,
    status: &ProjectStatus,
    busy: bool,
    message: Option<&ActionMessage>,
) -> PipelineAction {
    let mut action = PipelineAction::None;

    ui.horizontal(|ui| {
        if ui.button("⬅ Projects").clicked() {
            action = PipelineAction::Back;
        }
        ui.separator();
        ui.heading(project.project_id.as_str());
        ui.label(
            egui::RichText::new(format!("{} · {}", project.org_id, project.environment))
                .weak(),
        );
        ui.separator();
        if ui.add_enabled(!busy, egui::Button::new("⟳ Refresh")).clicked() {
            action = PipelineAction::Refresh;
        }
        if busy {
            ui.spinner();
        }
    });
    ui.separator();

    egui::Grid::new("pipeline_grid")
        .num_columns(4)
        .spacing([16.0, 10.0])
        .striped(true)
        .show(ui, |ui| {
            for (i, stage) in pipeline_stages(status).into_iter().enumerate() {
                let (mark, tint) = if stage.complete {
                    ("✔", egui::Color32::from_rgb(0x22, 0xc5, 0x5e))
                } else {
                    ("○", egui::Color32::from_gray(140))
                };
                ui.label(egui::RichText::new(format!("{} {}", mark, i + 1)).color(tint));
                ui.strong(stage.label);
                ui.label(egui::RichText::new(stage.description).weak());
                match stage.action {
                    Some((text, stage_action)) => {
                        if ui.add_enabled(!busy, egui::Button::new(text)).clicked() {
                            action = PipelineAction::Stage(stage_action);
                        }
                    }
                    None => {
                        ui.label("");
                    }
                }
                ui.end_row();
            }
        });

    if let Some(message) = message {
        ui.add_space(8.0);
        let tint = if message.ok {
            egui::Color32::from_rgb(0x22, 0xc5, 0x5e)
        } else {
            egui::Color32::from_rgb(0xef, 0x44, 0x44)
        };
        ui.label(egui::RichText::new(&message.text).color(tint));
    }

    action
}
