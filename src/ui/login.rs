// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Sign-in screen.

/// Credentials being typed.
#[derive(Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub enum LoginAction {
    None,
    Submit,
}

/// Display the sign-in form.
pub fn show(
    ui: &mut egui::Ui,
    form: &mut LoginForm,
    busy: bool,
    error: Option<&str>,
) -> LoginAction {
    let mut action = LoginAction::None;

    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.heading(
            egui::RichText::new("Solar Admin")
                .size(32.0)
                .color(egui::Color32::from_gray(200)),
        );
        ui.label(
            egui::RichText::new("Inspection pipeline dashboard")
                .size(14.0)
                .color(egui::Color32::from_gray(150)),
        );
        ui.add_space(24.0);

        ui.allocate_ui(egui::vec2(320.0, 200.0), |ui| {
            egui::Grid::new("login_grid")
                .num_columns(2)
                .spacing([8.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Email");
                    ui.add_enabled(!busy, egui::TextEdit::singleline(&mut form.email));
                    ui.end_row();

                    ui.label("Password");
                    let password = ui.add_enabled(
                        !busy,
                        egui::TextEdit::singleline(&mut form.password).password(true),
                    );
                    if password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        action = LoginAction::Submit;
                    }
                    ui.end_row();
                });
        });

        ui.add_space(12.0);
        if busy {
            ui.spinner();
        } else if ui.button("Sign in").clicked() {
            action = LoginAction::Submit;
        }

        if let Some(error) = error {
            ui.add_space(8.0);
            ui.label(egui::RichText::new(error).color(egui::Color32::from_rgb(0xef, 0x44, 0x44)));
        }
    });

    if busy {
        LoginAction::None
    } else {
        action
    }
}
