// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project list, grouped by environment and organisation.

use crate::models::project::{Environment, ProjectRef};
use crate::services::projects::ProjectListing;

pub enum ProjectsAction {
    None,
    Open(ProjectRef),
    Refresh,
}

pub fn show(
    ui: &mut egui::Ui,
    listing: Option<&ProjectListing>,
    default_environment: Environment,
    loading: bool,
    error: Option<&str>,
) -> ProjectsAction {
    let mut action = ProjectsAction::None;

    ui.horizontal(|ui| {
        ui.heading("Projects");
        if ui.add_enabled(!loading, egui::Button::new("⟳ Refresh")).clicked() {
            action = ProjectsAction::Refresh;
        }
        if loading {
            ui.spinner();
        }
    });
    ui.separator();

    if let Some(error) = error {
        ui.label(egui::RichText::new(error).color(egui::Color32::from_rgb(0xef, 0x44, 0x44)));
    }

    let Some(listing) = listing else {
        return action;
    };
    if listing.projects.is_empty() {
        ui.label(egui::RichText::new("No projects found").weak());
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for group in listing.grouped() {
            ui.add_space(8.0);
            ui.label(
                egui::RichText::new(group.environment.as_str().to_uppercase())
                    .strong()
                    .size(16.0),
            );
            for org in group.organizations {
                let header = match &org.email {
                    Some(email) => format!("{} ({})", org.org_id, email),
                    None => org.org_id.clone(),
                };
                egui::CollapsingHeader::new(header)
                    .id_source((group.environment.as_str(), org.org_id.as_str()))
                    .default_open(group.environment == default_environment)
                    .show(ui, |ui| {
                        for project in org.projects {
                            if ui.link(project.project_id.as_str()).clicked() {
                                action = ProjectsAction::Open(project);
                            }
                        }
                    });
            }
        }
    });

    action
}
