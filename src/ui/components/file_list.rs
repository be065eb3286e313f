// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Selectable list of CSV files with per-file conversion status.

use eframe::egui;

use crate::models::report::FileOutcome;

/// Conversion state of a single file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FileState {
    #[default]
    Idle,
    Queued,
    Converted(String),
    Failed(String),
}

/// One CSV file offered for conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub selected: bool,
    pub state: FileState,
}

/// MVU state for the file list.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct FileListModel {
    entries: Vec<FileEntry>,
}

/// Messages emitted by the file list view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileListMsg {
    Toggle(usize),
    SelectAll,
    SelectNone,
}

/// User-facing feedback surfaced to the status bar or error modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileListEvent {
    pub message: String,
    pub is_error: bool,
}

impl FileListModel {
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Replace the listing; previously selected names stay selected, new files start selected.
    pub fn set_files(&mut self, names: Vec<String>) {
        let previous = std::mem::take(&mut self.entries);
        self.entries = names
            .into_iter()
            .map(|name| {
                let selected = previous
                    .iter()
                    .find(|e| e.name == name)
                    .map(|e| e.selected)
                    .unwrap_or(true);
                FileEntry {
                    name,
                    selected,
                    state: FileState::Idle,
                }
            })
            .collect();
    }

    pub fn selected_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.name.clone())
            .collect()
    }

    /// Mark `names` as queued for conversion.
    pub fn mark_queued(&mut self, names: &[String]) {
        for entry in self.entries.iter_mut() {
            if names.contains(&entry.name) {
                entry.state = FileState::Queued;
            }
        }
    }

    /// Record a finished conversion. Returns false when the file is no longer listed.
    pub fn apply_outcome(&mut self, outcome: &FileOutcome) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.name == outcome.csv_name) else {
            return false;
        };
        entry.state = match &outcome.result {
            Ok(_) => FileState::Converted(outcome.summary()),
            Err(err) => FileState::Failed(err.clone()),
        };
        true
    }

    pub fn queued_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == FileState::Queued)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.state, FileState::Failed(_)))
            .count()
    }

    pub fn converted_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.state, FileState::Converted(_)))
            .count()
    }
}

/// Apply a message to the model. Returns a feedback event when relevant.
pub fn update(model: &mut FileListModel, msg: FileListMsg) -> Option<FileListEvent> {
    match msg {
        FileListMsg::Toggle(index) => {
            if let Some(entry) = model.entries.get_mut(index) {
                entry.selected = !entry.selected;
            }
            None
        }
        FileListMsg::SelectAll => {
            model.entries.iter_mut().for_each(|e| e.selected = true);
            Some(FileListEvent {
                message: format!("{} file(s) selected", model.entries.len()),
                is_error: false,
            })
        }
        FileListMsg::SelectNone => {
            model.entries.iter_mut().for_each(|e| e.selected = false);
            Some(FileListEvent {
                message: "Selection cleared".into(),
                is_error: false,
            })
        }
    }
}

/// Render the file list and return any messages triggered by user interaction.
pub fn view(ui: &mut egui::Ui, model: &FileListModel) -> Vec<FileListMsg> {
    let mut msgs = Vec::new();

    ui.horizontal(|ui| {
        if ui
            .add_enabled(
                !model.entries.is_empty(),
                egui::Button::new(format!("{} All", egui_phosphor::regular::CHECK_SQUARE)),
            )
            .clicked()
        {
            msgs.push(FileListMsg::SelectAll);
        }
        if ui
            .add_enabled(
                !model.entries.is_empty(),
                egui::Button::new(format!("{} None", egui_phosphor::regular::SQUARE)),
            )
            .clicked()
        {
            msgs.push(FileListMsg::SelectNone);
        }
    });

    ui.add_space(6.0);

    let visuals = ui.visuals().clone();
    egui::Frame::new()
        .fill(visuals.panel_fill)
        .stroke(visuals.window_stroke())
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            if model.entries.is_empty() {
                ui.label(
                    egui::RichText::new("No CSV files in this folder")
                        .color(egui::Color32::from_gray(150)),
                );
                return;
            }
            egui::Grid::new("file_list_grid")
                .num_columns(2)
                .spacing(egui::vec2(12.0, 6.0))
                .striped(true)
                .show(ui, |ui| {
                    for (index, entry) in model.entries.iter().enumerate() {
                        let mut selected = entry.selected;
                        if ui.checkbox(&mut selected, &entry.name).changed() {
                            msgs.push(FileListMsg::Toggle(index));
                        }
                        render_state(ui, &entry.state);
                        ui.end_row();
                    }
                });
        });

    msgs
}

fn render_state(ui: &mut egui::Ui, state: &FileState) {
    match state {
        FileState::Idle => {
            ui.label("");
        }
        FileState::Queued => {
            ui.horizontal(|ui| {
                ui.add(egui::Spinner::new().size(12.0));
                ui.label("Converting…");
            });
        }
        FileState::Converted(summary) => {
            ui.label(
                egui::RichText::new(format!("{} {summary}", egui_phosphor::regular::CHECK_CIRCLE))
                    .color(egui::Color32::from_rgb(46, 125, 50)),
            );
        }
        FileState::Failed(err) => {
            ui.label(
                egui::RichText::new(format!("{} Failed", egui_phosphor::regular::WARNING_CIRCLE))
                    .color(egui::Color32::from_rgb(198, 40, 40)),
            )
            .on_hover_text(err);
        }
    }
}
