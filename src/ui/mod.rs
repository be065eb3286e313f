// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Top-level egui application shell for converting CSV exports to RDF/XML.
//! Handles layout, form controls, and dispatching conversions to background workers.

pub mod components;

use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui;

use crate::config::AppConfig;
use crate::mvu::{self, AppModel, Command, CommandEnv, Msg};
use crate::ui::components::{file_list, folder_uid};

/// Stateful egui application driving the conversion workflow.
pub struct Csv2RdfApp {
    model: AppModel,
    inbox: Vec<Msg>,
    cmd_tx: crossbeam_channel::Sender<Command>,
    msg_rx: crossbeam_channel::Receiver<Msg>,
    log_dir: PathBuf,
}

impl Csv2RdfApp {
    /// Build the app and spawn the command workers.
    pub fn new(
        config: AppConfig,
        config_path: PathBuf,
        log_dir: PathBuf,
        notices: Vec<String>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<Command>();
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded::<Msg>();

        let model = AppModel::from_ui_state(&config.ui);
        let env = Arc::new(CommandEnv::new(config, config_path, log_dir));
        let log_dir = env.log_dir().to_path_buf();

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().max(2))
            .unwrap_or(2);
        for index in 0..threads {
            let cmd_rx = cmd_rx.clone();
            let msg_tx = msg_tx.clone();
            let env = Arc::clone(&env);
            let spawned = std::thread::Builder::new()
                .name(format!("worker-{index}"))
                .spawn(move || {
                    for cmd in cmd_rx.iter() {
                        let msg = mvu::run_command(cmd, &env);
                        let _ = msg_tx.send(msg);
                    }
                });
            if let Err(err) = spawned {
                tracing::error!("failed to spawn worker thread: {err}");
            }
        }

        let mut inbox: Vec<Msg> = notices.into_iter().map(Msg::StartupNotice).collect();
        if model.csv_dir.as_ref().is_some_and(|dir| dir.is_dir()) {
            inbox.push(Msg::Refresh);
        }

        Self {
            model,
            inbox,
            cmd_tx,
            msg_rx,
            log_dir,
        }
    }
}

impl eframe::App for Csv2RdfApp {
    /// Drives a single UI frame: drains worker results, applies messages to the
    /// model, dispatches resulting commands, then renders the panels.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_spacing(ctx);

        // Pull messages produced by the command workers.
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.model.pending_commands = self.model.pending_commands.saturating_sub(1);
            self.inbox.push(msg);
        }

        let msgs = std::mem::take(&mut self.inbox);
        for msg in msgs {
            let mut commands = Vec::new();
            mvu::update(&mut self.model, msg, &mut commands);
            for cmd in commands {
                if self.cmd_tx.send(cmd).is_ok() {
                    self.model.pending_commands += 1;
                }
            }
        }

        // Keep polling while workers are busy so results show up without input events.
        if self.model.pending_commands > 0 {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("CSV → RDF/XML");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_theme_controls(ui);
                    ui.separator();
                    self.render_convert_button(ui);
                });
            });
            ui.add_space(4.0);
        });

        self.render_error_modal(ctx);

        egui::TopBottomPanel::bottom("status_panel")
            .resizable(false)
            .show(ctx, |ui| {
                self.render_status(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);

            egui::ScrollArea::vertical().show(ui, |ui| {
                self.render_folder_group(ui);
                ui.add_space(12.0);

                self.render_folder_uid_input(ui);
                ui.add_space(12.0);

                self.render_files_section(ui);
                ui.add_space(8.0);
            });
        });
    }
}

impl Csv2RdfApp {
    fn ensure_spacing(&self, ctx: &egui::Context) {
        ctx.style_mut(|style| {
            style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        });
    }

    fn render_theme_controls(&mut self, ui: &mut egui::Ui) {
        ui.add_space(2.0);
        egui::widgets::global_theme_preference_switch(ui);
    }

    /// Render the "Convert" button; enabled once a folder, a selection and a valid UID exist.
    fn render_convert_button(&mut self, ui: &mut egui::Ui) {
        let button = egui::Button::new(format!("{} Convert", egui_phosphor::regular::PLAY));
        if ui
            .add_enabled(self.model.can_convert(), button)
            .on_disabled_hover_text(
                "Choose a folder, select CSV files and enter a valid folder UID",
            )
            .clicked()
        {
            self.inbox.push(Msg::ConvertRequested);
        }
    }

    /// Source folder row with pick/refresh/open actions.
    fn render_folder_group(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label("CSV folder");
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                let shown = self
                    .model
                    .csv_dir
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_else(|| "No folder selected".into());
                ui.label(egui::RichText::new(shown).monospace());
            });
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui
                    .button(format!("{} Choose…", egui_phosphor::regular::FOLDER_OPEN))
                    .clicked()
                {
                    self.inbox.push(Msg::PickDirectory);
                }
                let has_dir = self.model.csv_dir.is_some();
                if ui
                    .add_enabled(
                        has_dir,
                        egui::Button::new(format!(
                            "{} Refresh",
                            egui_phosphor::regular::ARROWS_CLOCKWISE
                        )),
                    )
                    .clicked()
                {
                    self.inbox.push(Msg::Refresh);
                }
                if ui
                    .add_enabled(
                        has_dir,
                        egui::Button::new(format!("{} Open", egui_phosphor::regular::FOLDER)),
                    )
                    .on_hover_text("Open the folder holding the generated XML files")
                    .clicked()
                {
                    self.inbox.push(Msg::OpenOutputFolder);
                }
                if ui
                    .button(format!("{} Logs", egui_phosphor::regular::FILE_TEXT))
                    .on_hover_text(format!("Open {}", self.log_dir.display()))
                    .clicked()
                {
                    self.inbox.push(Msg::OpenLogFolder);
                }
            });
            ui.add_space(6.0);
            ui.label(
                egui::RichText::new("Each name.csv is converted to name.xml in the same folder.")
                    .small()
                    .color(egui::Color32::from_gray(110)),
            );
        });
    }

    fn render_folder_uid_input(&mut self, ui: &mut egui::Ui) {
        ui.label("Folder UID");
        ui.label(
            egui::RichText::new("Generated roles are placed in the folder object with this UID.")
                .small()
                .color(egui::Color32::from_gray(110)),
        );
        ui.add_space(4.0);
        let msgs = folder_uid::view(ui, &self.model.folder_uid);
        self.inbox.extend(msgs.into_iter().map(Msg::FolderUid));
    }

    fn render_files_section(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("CSV files")
            .default_open(true)
            .show(ui, |ui| {
                let msgs = file_list::view(ui, &self.model.files);
                self.inbox.extend(msgs.into_iter().map(Msg::FileList));
            });
    }

    /// Render a simple modal window for error messages.
    fn render_error_modal(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.model.error.clone() {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.inbox.push(Msg::DismissError);
                    }
                });
        }
    }

    /// Render latest status message when present.
    fn render_status(&self, ui: &mut egui::Ui) {
        if let Some(text) = &self.model.status {
            let display = if self.model.pending_commands > 0 {
                format!("{}  ({} working…)", text, self.model.pending_commands)
            } else {
                text.to_string()
            };
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(display).color(egui::Color32::from_gray(68)));
                if self.model.pending_commands > 0 {
                    ui.add(egui::Spinner::new().size(14.0)).on_hover_text(format!(
                        "{} task(s) running in background",
                        self.model.pending_commands
                    ));
                }
            });
        }
    }
}
