// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the current screen and the active editor session. Storage,
//! identity and job calls run on background threads and report back over
//! a channel that is drained at the start of each frame.

use crate::editor::interaction::{
    Annotations, Effect, EditorEvent, EditorKey, EditorState, SessionStatus, Step,
};
use crate::editor::EditorKind;
use crate::io::media::{self, TexturePixels};
use crate::io::serialization::boxes_from_annotations;
use crate::models::project::{ProjectRef, ProjectStatus, StageAction};
use crate::services::auth::{self, Session};
use crate::services::projects::{list_projects, ProjectListing};
use crate::services::{annotations, jobs, status, Services};
use crate::ui::login::{LoginAction, LoginForm};
use crate::ui::pipeline::{ActionMessage, PipelineAction};
use crate::ui::projects::ProjectsAction;
use crate::ui::toolbar::ToolbarAction;
use crate::ui::{canvas, login, pipeline, projects, properties, toolbar};
use crate::util::geometry::Size;
use std::sync::mpsc::{channel, Receiver, Sender};

#[derive(Debug, Clone, PartialEq)]
enum Screen {
    Login,
    Projects,
    Pipeline(ProjectRef),
    Editor(ProjectRef, EditorKind),
}

/// Image and annotations fetched for a new editor session.
struct LoadedSession {
    /// Source image size; shapes live in these pixels
    image_size: Size,
    /// Possibly downscaled to the renderer's texture limit
    texture: TexturePixels,
    annotations: Annotations,
}

/// Result of a background task.
enum TaskResult {
    Login(Result<Session, String>),
    Projects(Result<ProjectListing, String>),
    Status(ProjectRef, Result<ProjectStatus, String>),
    Action(Result<String, String>),
    EditorLoaded(ProjectRef, EditorKind, Result<LoadedSession, String>),
    Saved(ProjectRef, EditorKind, Result<String, String>),
}

/// Main application state.
pub struct SolarAdminApp {
    services: Services,
    screen: Screen,

    /// Signed-in administrator
    session: Option<Session>,
    login_form: LoginForm,
    login_error: Option<String>,

    projects: Option<ProjectListing>,
    projects_error: Option<String>,

    /// Status of the project on the pipeline screen
    status: Option<ProjectStatus>,
    action_message: Option<ActionMessage>,

    editor: Option<EditorState>,
    /// Texture of the image under the active editor
    texture: Option<egui::TextureHandle>,

    sender: Sender<TaskResult>,
    receiver: Receiver<TaskResult>,
    /// Background tasks still running
    pending: usize,
}

impl SolarAdminApp {
    pub fn new(services: Services) -> Self {
        let (sender, receiver) = channel();
        Self {
            services,
            screen: Screen::Login,
            session: None,
            login_form: LoginForm::default(),
            login_error: None,
            projects: None,
            projects_error: None,
            status: None,
            action_message: None,
            editor: None,
            texture: None,
            sender,
            receiver,
            pending: 0,
        }
    }

    fn busy(&self) -> bool {
        self.pending > 0
    }

    /// Run `task` on a worker thread; its result arrives through `poll_tasks`.
    fn spawn<F>(&mut self, ctx: &egui::Context, task: F)
    where
        F: FnOnce(&Services) -> TaskResult + Send + 'static,
    {
        let services = self.services.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        self.pending += 1;
        std::thread::spawn(move || {
            let result = task(&services);
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }

    fn sign_in(&mut self, ctx: &egui::Context) {
        let email = self.login_form.email.clone();
        let password = self.login_form.password.clone();
        self.login_error = None;
        self.spawn(ctx, move |services| {
            let result = auth::login(
                services.identity.as_ref(),
                &email,
                &password,
                &services.config.identity.admin_group,
            )
            .map_err(|e| e.to_string());
            TaskResult::Login(result)
        });
    }

    fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            let identity = self.services.identity.clone();
            std::thread::spawn(move || auth::logout(identity.as_ref(), &session));
        }
        self.screen = Screen::Login;
        self.login_form.password.clear();
        self.projects = None;
        self.status = None;
        self.editor = None;
        self.texture = None;
    }

    fn refresh_projects(&mut self, ctx: &egui::Context) {
        self.projects_error = None;
        self.spawn(ctx, |services| {
            let result = list_projects(
                services.store.as_ref(),
                &services.config.environments,
                services.identity.as_ref(),
            )
            .map_err(|e| e.to_string());
            TaskResult::Projects(result)
        });
    }

    fn open_pipeline(&mut self, ctx: &egui::Context, project: ProjectRef) {
        self.screen = Screen::Pipeline(project.clone());
        self.status = None;
        self.action_message = None;
        self.refresh_status(ctx, project);
    }

    fn refresh_status(&mut self, ctx: &egui::Context, project: ProjectRef) {
        self.spawn(ctx, move |services| {
            let env = services.environment(&project);
            let result = status::project_status(services.store.as_ref(), env, &project)
                .map_err(|e| e.to_string());
            TaskResult::Status(project, result)
        });
    }

    fn run_stage(&mut self, ctx: &egui::Context, project: ProjectRef, action: StageAction) {
        match action {
            StageAction::EditCrop => self.open_editor(ctx, project, EditorKind::Crop),
            StageAction::ReviewDetections => self.open_editor(ctx, project, EditorKind::Boxes),
            StageAction::Job(job) => {
                self.action_message = None;
                self.spawn(ctx, move |services| {
                    let queue = services.jobs.as_ref();
                    let result = jobs::trigger_action(queue, &services.config, &project, job.id())
                        .map(|submission| format!("Job submitted: {}", submission.job_name))
                        .map_err(|e| e.to_string());
                    TaskResult::Action(result)
                });
            }
        }
    }

    fn open_editor(&mut self, ctx: &egui::Context, project: ProjectRef, kind: EditorKind) {
        log::info!("Opening {} for {}", kind.title(), project.prefix());
        self.editor = Some(EditorState::new(kind, self.services.config.editor, project.clone()));
        self.texture = None;
        self.screen = Screen::Editor(project.clone(), kind);
        let max_side = u32::try_from(ctx.input(|i| i.max_texture_side)).unwrap_or(u32::MAX);
        self.spawn(ctx, move |services| {
            let result = load_session(services, &project, kind, max_side)
                .map_err(|e| format!("{:#}", e));
            TaskResult::EditorLoaded(project, kind, result)
        });
    }

    fn close_editor(&mut self, ctx: &egui::Context) {
        if let Screen::Editor(project, _) = &self.screen {
            let project = project.clone();
            self.editor = None;
            self.texture = None;
            self.open_pipeline(ctx, project);
        }
    }

    fn is_editing(&self, project: &ProjectRef, kind: EditorKind) -> bool {
        self.editor.is_some() && self.screen == Screen::Editor(project.clone(), kind)
    }

    /// Feed one event to the editor and carry out its effect.
    fn dispatch(&mut self, ctx: &egui::Context, event: EditorEvent) {
        let Some(state) = self.editor.take() else {
            return;
        };
        let Step { state, effect } = state.dispatch(event);
        self.editor = Some(state);

        match effect {
            Effect::None => {}
            Effect::Redraw => ctx.request_repaint(),
            Effect::Rejected(err) => log::warn!("Editor rejected action: {}", err),
            Effect::SaveBoxes(request) => {
                self.save(ctx, EditorKind::Boxes, serde_json::to_value(&request))
            }
            Effect::SaveCrop(crop) => {
                self.save(ctx, EditorKind::Crop, serde_json::to_value(&crop))
            }
        }
    }

    fn save(
        &mut self,
        ctx: &egui::Context,
        kind: EditorKind,
        body: serde_json::Result<serde_json::Value>,
    ) {
        let Some(project) = self.editor.as_ref().map(|state| state.project().clone()) else {
            return;
        };
        let body = match body {
            Ok(body) => body,
            Err(e) => {
                self.dispatch(ctx, EditorEvent::SaveFinished(Err(e.to_string())));
                return;
            }
        };
        self.spawn(ctx, move |services| {
            let env = services.environment(&project);
            let store = services.store.as_ref();
            let result = match kind {
                EditorKind::Boxes => {
                    annotations::save_defect_annotations(store, env, &project, body)
                }
                EditorKind::Crop => annotations::save_crop_annotations(store, env, &project, body),
            }
            .map_err(|e| e.to_string());
            TaskResult::Saved(project, kind, result)
        });
    }

    /// Drain finished background tasks.
    fn poll_tasks(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.receiver.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            match result {
                TaskResult::Login(Ok(session)) => {
                    self.session = Some(session);
                    self.login_form.password.clear();
                    self.screen = Screen::Projects;
                    self.refresh_projects(ctx);
                }
                TaskResult::Login(Err(e)) => {
                    log::warn!("Sign-in failed: {}", e);
                    self.login_error = Some(e);
                }
                TaskResult::Projects(Ok(listing)) => {
                    log::info!("Listed {} projects", listing.projects.len());
                    self.projects = Some(listing);
                }
                TaskResult::Projects(Err(e)) => {
                    log::error!("Failed to list projects: {}", e);
                    self.projects_error = Some(e);
                }
                TaskResult::Status(project, result) => {
                    if self.screen != Screen::Pipeline(project) {
                        continue;
                    }
                    match result {
                        Ok(status) => self.status = Some(status),
                        Err(e) => {
                            log::error!("Failed to read project status: {}", e);
                            self.status = Some(ProjectStatus::default());
                            self.action_message = Some(ActionMessage {
                                ok: false,
                                text: format!("Status unavailable: {}", e),
                            });
                        }
                    }
                }
                TaskResult::Action(result) => {
                    self.action_message = Some(match result {
                        Ok(text) => ActionMessage { ok: true, text },
                        Err(text) => {
                            log::error!("Pipeline action failed: {}", text);
                            ActionMessage { ok: false, text }
                        }
                    });
                }
                TaskResult::EditorLoaded(project, kind, result) => {
                    if !self.is_editing(&project, kind) {
                        log::debug!("Dropping stale session for {}", project.prefix());
                        continue;
                    }
                    match result {
                        Ok(loaded) => {
                            let pixels = &loaded.texture;
                            let size = [pixels.width as usize, pixels.height as usize];
                            let color_image =
                                egui::ColorImage::from_rgba_unmultiplied(size, &pixels.pixels);
                            let texture = ctx.load_texture(
                                "orthophoto",
                                color_image,
                                egui::TextureOptions::LINEAR,
                            );
                            self.texture = Some(texture);
                            log::info!(
                                "Loaded {}x{} image for {}",
                                loaded.image_size.width,
                                loaded.image_size.height,
                                project.prefix()
                            );

                            self.dispatch(
                                ctx,
                                EditorEvent::SessionLoaded {
                                    image: loaded.image_size,
                                    annotations: loaded.annotations,
                                },
                            );
                        }
                        Err(e) => self.dispatch(ctx, EditorEvent::LoadFailed(e)),
                    }
                }
                TaskResult::Saved(project, kind, result) => {
                    match &result {
                        Ok(message) => log::info!("{} for {}", message, project.prefix()),
                        Err(e) => log::error!("Save failed for {}: {}", project.prefix(), e),
                    }
                    if self.is_editing(&project, kind) {
                        self.dispatch(ctx, EditorEvent::SaveFinished(result));
                    }
                }
            }
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        let mut sign_out = false;
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Solar Admin");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Sign out").clicked() {
                        sign_out = true;
                    }
                    if let Some(session) = &self.session {
                        ui.label(egui::RichText::new(&session.user.email).weak());
                    }
                });
            });
        });
        if sign_out {
            self.sign_out();
        }
    }

    fn show_login(&mut self, ctx: &egui::Context) {
        let busy = self.busy();
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                login::show(ui, &mut self.login_form, busy, self.login_error.as_deref())
            })
            .inner;
        if let LoginAction::Submit = action {
            self.sign_in(ctx);
        }
    }

    fn show_projects(&mut self, ctx: &egui::Context) {
        self.show_header(ctx);
        let busy = self.busy();
        let default_environment = self.services.config.default_environment;
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                projects::show(
                    ui,
                    self.projects.as_ref(),
                    default_environment,
                    busy,
                    self.projects_error.as_deref(),
                )
            })
            .inner;
        match action {
            ProjectsAction::Open(project) => self.open_pipeline(ctx, project),
            ProjectsAction::Refresh => self.refresh_projects(ctx),
            ProjectsAction::None => {}
        }
    }

    fn show_pipeline(&mut self, ctx: &egui::Context, project: ProjectRef) {
        self.show_header(ctx);
        let busy = self.busy();
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| match &self.status {
                Some(status) => {
                    pipeline::show(ui, &project, status, busy, self.action_message.as_ref())
                }
                None => {
                    ui.centered_and_justified(|ui| ui.spinner());
                    PipelineAction::None
                }
            })
            .inner;
        match action {
            PipelineAction::Back => {
                self.screen = Screen::Projects;
                self.status = None;
            }
            PipelineAction::Refresh => self.refresh_status(ctx, project),
            PipelineAction::Stage(stage) => self.run_stage(ctx, project, stage),
            PipelineAction::None => {}
        }
    }

    fn show_editor(&mut self, ctx: &egui::Context, project: ProjectRef) {
        let Some(state) = self.editor.as_ref() else {
            return;
        };

        if let SessionStatus::Failed(message) = &state.status {
            let back = egui::CentralPanel::default()
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(40.0);
                        ui.heading(state.kind.title());
                        ui.label(
                            egui::RichText::new(message)
                                .size(16.0)
                                .color(egui::Color32::from_rgb(0xef, 0x44, 0x44)),
                        );
                        ui.add_space(10.0);
                        ui.button("⬅ Pipeline").clicked()
                    })
                    .inner
                })
                .inner;
            if back {
                self.close_editor(ctx);
            }
            return;
        }

        let mut events = Vec::new();
        let mut back = false;
        let title = format!("{}: {}", state.kind.title(), project.project_id);

        match egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, state, &title))
            .inner
        {
            ToolbarAction::Back => back = true,
            ToolbarAction::Editor(event) => events.push(event),
            ToolbarAction::None => {}
        }

        let properties_event = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| properties::show(ui, state))
            .inner;
        events.extend(properties_event);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(egui::RichText::new(state.status_line()).small());
        });

        let canvas_events = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if state.status == SessionStatus::Loading {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new("Loading image...")
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    Vec::new()
                } else {
                    canvas::show(ui, state, self.texture.as_ref())
                }
            })
            .inner;
        events.extend(canvas_events);
        events.extend(editor_keys(ctx));

        for event in events {
            self.dispatch(ctx, event);
        }
        if back {
            self.close_editor(ctx);
        }
    }
}

/// Fetch the image and stored annotations for an editor.
fn load_session(
    services: &Services,
    project: &ProjectRef,
    kind: EditorKind,
    max_texture_side: u32,
) -> anyhow::Result<LoadedSession> {
    let env = services.environment(project);
    let store = services.store.as_ref();
    let ttl = services.config.signed_url_ttl_secs;

    let (image_url, annotations) = match kind {
        EditorKind::Boxes => {
            let payload = annotations::load_defect_session(store, env, project, ttl)?;
            let boxes = boxes_from_annotations(&payload.annotations);
            (payload.image_url, Annotations::Boxes(boxes))
        }
        EditorKind::Crop => {
            let payload = annotations::load_crop_session(store, env, project, ttl)?;
            (payload.image_url, Annotations::Crop(payload.annotations))
        }
    };

    let image = media::load_image_url(&image_url)?;
    let image_size = Size::new(image.width as f64, image.height as f64);
    let texture = media::texture_pixels(image, max_texture_side)?;
    Ok(LoadedSession {
        image_size,
        texture,
        annotations,
    })
}

/// Editor shortcuts, unless a text field has focus.
fn editor_keys(ctx: &egui::Context) -> Vec<EditorEvent> {
    if ctx.wants_keyboard_input() {
        return Vec::new();
    }
    ctx.input(|i| {
        let mut events = Vec::new();
        if i.modifiers.command && i.key_pressed(egui::Key::S) {
            events.push(EditorEvent::Save);
            return events;
        }
        if i.key_pressed(egui::Key::Delete) {
            events.push(EditorEvent::Key(EditorKey::Delete));
        }
        if i.key_pressed(egui::Key::Backspace) {
            events.push(EditorEvent::Key(EditorKey::Backspace));
        }
        if i.key_pressed(egui::Key::Escape) {
            events.push(EditorEvent::Key(EditorKey::Escape));
        }
        let digits = [
            (egui::Key::Num1, 1),
            (egui::Key::Num2, 2),
            (egui::Key::Num3, 3),
            (egui::Key::Num4, 4),
        ];
        for (key, digit) in digits {
            if i.key_pressed(key) {
                events.push(EditorEvent::Key(EditorKey::Digit(digit)));
            }
        }
        events
    })
}

impl eframe::App for SolarAdminApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_tasks(ctx);

        // Keep the spinner moving while tasks run
        if self.busy() {
            ctx.request_repaint();
        }

        match self.screen.clone() {
            Screen::Login => self.show_login(ctx),
            Screen::Projects => self.show_projects(ctx),
            Screen::Pipeline(project) => self.show_pipeline(ctx, project),
            Screen::Editor(project, _) => self.show_editor(ctx, project),
        }
    }
}
