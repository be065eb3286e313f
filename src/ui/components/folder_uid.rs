// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Input for the UID of the folder object that generated roles are attached to.

use eframe::egui;

use crate::models::row::{gen_uid, is_valid_uuid};

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct FolderUidModel {
    text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FolderUidMsg {
    Changed(String),
    Generate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderUidEvent {
    pub message: String,
    pub is_error: bool,
}

impl FolderUidModel {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Trimmed UID when it parses, `None` otherwise.
    pub fn valid_uid(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        is_valid_uuid(trimmed).then_some(trimmed)
    }
}

pub fn update(model: &mut FolderUidModel, msg: FolderUidMsg) -> Option<FolderUidEvent> {
    match msg {
        FolderUidMsg::Changed(text) => {
            model.text = text;
            None
        }
        FolderUidMsg::Generate => {
            model.text = gen_uid();
            Some(FolderUidEvent {
                message: format!("Generated folder UID {}", model.text),
                is_error: false,
            })
        }
    }
}

pub fn view(ui: &mut egui::Ui, model: &FolderUidModel) -> Vec<FolderUidMsg> {
    let mut msgs = Vec::new();

    ui.horizontal(|ui| {
        let mut text = model.text().to_string();
        let response = ui.add(
            egui::TextEdit::singleline(&mut text)
                .hint_text("e.g. 3f2a9c1e-7b4d-4e8a-a1c5-9d0e6b2f4a77")
                .desired_width(320.0),
        );
        if response.changed() {
            msgs.push(FolderUidMsg::Changed(text));
        }
        if ui
            .button(format!("{} Generate", egui_phosphor::regular::SPARKLE))
            .on_hover_text("Create a new random UID")
            .clicked()
        {
            msgs.push(FolderUidMsg::Generate);
        }
    });

    if !model.text().trim().is_empty() && model.valid_uid().is_none() {
        ui.label(
            egui::RichText::new("Not a valid UUID")
                .small()
                .color(egui::Color32::from_rgb(198, 40, 40)),
        );
    }

    msgs
}
