// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Root Model-View-Update kernel wiring component state, messages, and commands.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{AppConfig, UiState};
use crate::logging::LoggerManager;
use crate::logic::csv_processor::{BatchProcessor, CsvProcessor};
use crate::logic::file_manager::{list_csv_files, xml_output_path};
use crate::models::report::FileOutcome;
use crate::ui::components::file_list::{self, FileListModel, FileListMsg};
use crate::ui::components::folder_uid::{self, FolderUidModel, FolderUidMsg};

/// Top-level application state.
#[derive(Default)]
pub struct AppModel {
    /// Folder the CSV files are read from and XML written to.
    pub csv_dir: Option<PathBuf>,
    /// CSV files found in `csv_dir`.
    pub files: FileListModel,
    /// Parent folder UID for generated roles.
    pub folder_uid: FolderUidModel,
    /// Latest status message to display.
    pub status: Option<String>,
    /// Latest error message to display in modal.
    pub error: Option<String>,
    /// Count of queued background commands.
    pub pending_commands: usize,
}

impl AppModel {
    /// Restore the remembered folder and UID.
    pub fn from_ui_state(state: &UiState) -> Self {
        Self {
            csv_dir: state.last_directory.clone(),
            folder_uid: FolderUidModel::new(state.last_folder_uid.clone().unwrap_or_default()),
            ..Default::default()
        }
    }

    fn ui_state(&self) -> UiState {
        UiState {
            last_directory: self.csv_dir.clone(),
            last_folder_uid: self.folder_uid.valid_uid().map(str::to_string),
        }
    }

    /// Whether the convert action has everything it needs.
    pub fn can_convert(&self) -> bool {
        self.csv_dir.is_some()
            && !self.files.selected_names().is_empty()
            && self.folder_uid.valid_uid().is_some()
            && self.files.queued_count() == 0
    }
}

/// Application messages routed through the update function.
pub enum Msg {
    PickDirectory,
    DirectoryPicked(Option<PathBuf>),
    Refresh,
    FilesListed {
        dir: PathBuf,
        result: Result<Vec<String>, String>,
    },
    ConvertRequested,
    FilesConverted(Vec<FileOutcome>),
    OpenOutputFolder,
    OpenLogFolder,
    PathOpened(Result<PathBuf, String>),
    SettingsSaved(Result<(), String>),
    /// Problem found while starting up, shown once the window is open.
    StartupNotice(String),
    DismissError,
    FileList(FileListMsg),
    FolderUid(FolderUidMsg),
}

/// Commands represent side-effects executed between frames.
pub enum Command {
    PickDirectory { start: Option<PathBuf> },
    ListFiles(PathBuf),
    ConvertFiles(ConvertJob),
    SaveSettings(UiState),
    OpenLogFolder,
    OpenPath(PathBuf),
}

/// Captured, validated data for converting files of one folder.
pub struct ConvertJob {
    pub folder_uid: String,
    pub dir: PathBuf,
    pub csv_names: Vec<String>,
}

/// Everything commands need from the outside world, shared by all workers.
pub struct CommandEnv {
    batch: Result<BatchProcessor, String>,
    exclude_files: Vec<String>,
    config: AppConfig,
    config_path: PathBuf,
    log_dir: PathBuf,
}

impl CommandEnv {
    pub fn new(config: AppConfig, config_path: PathBuf, log_dir: PathBuf) -> Self {
        let loggers = LoggerManager::from_config(&config.logging, log_dir.clone());
        let batch = CsvProcessor::new(&config)
            .map(|processor| BatchProcessor::new(processor, loggers))
            .map_err(|err| format!("Invalid configuration: {err:#}"));
        Self {
            batch,
            exclude_files: config.file_management.exclude_files.clone(),
            config,
            config_path,
            log_dir,
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Update the application model and enqueue commands.
pub fn update(model: &mut AppModel, msg: Msg, cmds: &mut Vec<Command>) {
    match msg {
        Msg::PickDirectory => cmds.push(Command::PickDirectory {
            start: model.csv_dir.clone(),
        }),
        Msg::DirectoryPicked(Some(dir)) => {
            model.files.set_files(Vec::new());
            model.csv_dir = Some(dir.clone());
            cmds.push(Command::ListFiles(dir));
            cmds.push(Command::SaveSettings(model.ui_state()));
        }
        Msg::DirectoryPicked(None) => {
            surface_event(model, "Folder selection cancelled.".into(), false)
        }
        Msg::Refresh => match &model.csv_dir {
            Some(dir) if model.files.queued_count() == 0 => {
                cmds.push(Command::ListFiles(dir.clone()))
            }
            Some(_) => surface_event(model, "Wait for the running conversion to finish.".into(), false),
            None => surface_event(model, "Choose a folder first.".into(), false),
        },
        Msg::FilesListed { dir, result } => {
            // Ignore listings for a folder the user already moved away from.
            if model.csv_dir.as_deref() != Some(dir.as_path()) {
                return;
            }
            match result {
                Ok(names) => {
                    let count = names.len();
                    model.files.set_files(names);
                    surface_event(
                        model,
                        format!("{count} CSV file(s) found in {}", dir.display()),
                        false,
                    );
                }
                Err(err) => {
                    model.files.set_files(Vec::new());
                    surface_event(model, format!("Failed to list folder:\n\n{err}"), true);
                }
            }
        }
        Msg::ConvertRequested => match validate_for_convert(model) {
            Ok(jobs) => {
                let names: Vec<String> = jobs.iter().flat_map(|j| j.csv_names.clone()).collect();
                model.files.mark_queued(&names);
                surface_event(model, format!("Converting {} file(s)…", names.len()), false);
                cmds.push(Command::SaveSettings(model.ui_state()));
                cmds.extend(jobs.into_iter().map(Command::ConvertFiles));
            }
            Err(err) => surface_event(model, err, true),
        },
        Msg::FilesConverted(outcomes) => {
            for outcome in &outcomes {
                if let Ok(report) = &outcome.result {
                    info!(
                        encoding = report.encoding,
                        xml = %outcome.xml_path.display(),
                        "{}",
                        outcome.summary()
                    );
                } else {
                    warn!("{}", outcome.summary());
                }
                if !model.files.apply_outcome(outcome) {
                    warn!("conversion result for unlisted file {}", outcome.csv_name);
                }
            }
            if model.files.queued_count() > 0 {
                if let Some(last) = outcomes.last() {
                    surface_event(model, last.summary(), false);
                }
                return;
            }
            let failed = model.files.failed_count();
            let converted = model.files.converted_count();
            if failed > 0 {
                surface_event(
                    model,
                    format!(
                        "Conversion finished: {converted} converted, {failed} failed.\n\nSee the per-file logs for details."
                    ),
                    true,
                );
            } else {
                surface_event(model, format!("Conversion finished: {converted} converted."), false);
            }
        }
        Msg::OpenOutputFolder => match &model.csv_dir {
            Some(dir) => cmds.push(Command::OpenPath(dir.clone())),
            None => surface_event(model, "Choose a folder first.".into(), false),
        },
        Msg::OpenLogFolder => cmds.push(Command::OpenLogFolder),
        Msg::PathOpened(result) => {
            if let Err(err) = result {
                surface_event(model, format!("Failed to open folder:\n\n{err}"), true);
            }
        }
        Msg::SettingsSaved(result) => {
            if let Err(err) = result {
                warn!("{err}");
                model.status = Some(format!("Settings not saved: {err}"));
            }
        }
        Msg::StartupNotice(notice) => {
            let message = match model.error.take() {
                Some(previous) => format!("{previous}\n\n{notice}"),
                None => notice,
            };
            surface_event(model, message, true);
        }
        Msg::DismissError => model.error = None,
        Msg::FileList(m) => {
            if let Some(event) = file_list::update(&mut model.files, m) {
                surface_event(model, event.message, event.is_error);
            }
        }
        Msg::FolderUid(m) => {
            if let Some(event) = folder_uid::update(&mut model.folder_uid, m) {
                surface_event(model, event.message, event.is_error);
            }
        }
    }
}

/// Execute a command synchronously and return a resulting message.
pub fn run_command(cmd: Command, env: &CommandEnv) -> Msg {
    match cmd {
        Command::PickDirectory { start } => {
            let mut dialog = rfd::FileDialog::new().set_title("Select folder with CSV files");
            if let Some(start) = start.filter(|p| p.is_dir()) {
                dialog = dialog.set_directory(start);
            }
            Msg::DirectoryPicked(dialog.pick_folder())
        }
        Command::ListFiles(dir) => {
            let result =
                list_csv_files(&dir, &env.exclude_files).map_err(|err| format!("{err:#}"));
            Msg::FilesListed { dir, result }
        }
        Command::ConvertFiles(job) => {
            let outcomes = match &env.batch {
                Ok(batch) => batch.process_files(&job.folder_uid, &job.dir, &job.csv_names),
                Err(err) => job
                    .csv_names
                    .into_iter()
                    .map(|csv_name| FileOutcome {
                        xml_path: xml_output_path(&job.dir, &csv_name),
                        csv_name,
                        result: Err(err.clone()),
                    })
                    .collect(),
            };
            Msg::FilesConverted(outcomes)
        }
        Command::SaveSettings(state) => {
            let result = env
                .config
                .save_ui_state(&env.config_path, &state)
                .map_err(|err| format!("{err:#}"));
            if result.is_ok() {
                info!("settings saved to {}", env.config_path.display());
            }
            Msg::SettingsSaved(result)
        }
        Command::OpenLogFolder => Msg::PathOpened(open_path(env.log_dir.clone())),
        Command::OpenPath(path) => Msg::PathOpened(open_path(path)),
    }
}

fn open_path(path: PathBuf) -> Result<PathBuf, String> {
    open::that_detached(&path)
        .map(|_| path)
        .map_err(|err| err.to_string())
}

/// Update status/error fields consistently for user feedback.
fn surface_event(model: &mut AppModel, message: String, is_error: bool) {
    if is_error {
        model.error = Some(message.clone());
    }
    model.status = Some(message);
}

/// Validate model state and build one job per selected file, so files convert in parallel.
fn validate_for_convert(model: &AppModel) -> Result<Vec<ConvertJob>, String> {
    if model.files.queued_count() > 0 {
        return Err("A conversion is already running.".into());
    }
    let dir = model
        .csv_dir
        .clone()
        .ok_or_else(|| "Please choose a folder with CSV files.".to_string())?;
    let folder_uid = model
        .folder_uid
        .valid_uid()
        .ok_or_else(|| "Please enter a valid folder UID.".to_string())?
        .to_string();
    let selected = model.files.selected_names();
    if selected.is_empty() {
        return Err("Please select at least one CSV file.".into());
    }

    Ok(selected
        .into_iter()
        .map(|csv_name| ConvertJob {
            folder_uid: folder_uid.clone(),
            dir: dir.clone(),
            csv_names: vec![csv_name],
        })
        .collect())
}
