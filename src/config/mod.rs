// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Application configuration loaded from `config.json`.
//!
//! Every field carries a default so partial files keep working; the shipped
//! `config.json` only needs to override what differs for a deployment.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// File name looked up beside the executable.
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const MD_NS: &str = "http://iec.ch/TC57/61970-552/ModelDescription/1#";
pub const CIM_NS: &str = "http://iec.ch/TC57/2014/CIM-schema-cim16#";

/// Root configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub csv_processing: CsvProcessingConfig,
    pub xml_generation: XmlGenerationConfig,
    pub file_management: FileManagementConfig,
    pub logging: LoggingConfig,
    pub ui: UiState,
}

/// How CSV rows are read, validated and named.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvProcessingConfig {
    /// Columns that must be present and non-blank; `*_uid` columns must hold a UUID.
    pub required_fields: Vec<String>,
    pub model_version: String,
    pub model_name: String,
    pub default_delimiter: String,
    /// Template for `Role` names, e.g. `"Роль {org_name}"`.
    pub role_template: String,
    /// Template for `DataGroup` names.
    pub datagroup_template: String,
}

impl Default for CsvProcessingConfig {
    fn default() -> Self {
        Self {
            required_fields: Vec::new(),
            model_version: "1.0.0".into(),
            model_name: "Access".into(),
            default_delimiter: ";".into(),
            role_template: "Роль {org_name}".into(),
            datagroup_template: "Группа {org_name}".into(),
        }
    }
}

/// Namespaces and fixed resource references used by the RDF writer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlGenerationConfig {
    /// Prefix → namespace URI. `rdf` is mandatory.
    pub namespaces: BTreeMap<String, String>,
    /// Optional namespace for `Model.name` (declared with the `me` prefix).
    pub me_namespace: Option<String>,
    pub fixed_resources: FixedResources,
}

impl Default for XmlGenerationConfig {
    fn default() -> Self {
        Self {
            namespaces: default_namespaces(),
            me_namespace: None,
            fixed_resources: FixedResources::default(),
        }
    }
}

impl XmlGenerationConfig {
    /// Namespace URI for `prefix`, falling back to the built-in defaults.
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str).or(match prefix {
            "rdf" => Some(RDF_NS),
            "md" => Some(MD_NS),
            "cim" => Some(CIM_NS),
            _ => None,
        })
    }
}

fn default_namespaces() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("cim".to_string(), CIM_NS.to_string()),
        ("md".to_string(), MD_NS.to_string()),
        ("rdf".to_string(), RDF_NS.to_string()),
    ])
}

/// Resource references that are identical for every generated structure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedResources {
    pub datagroup_parent_object: String,
    pub privilege_operation: String,
    pub dataitem_category: String,
    pub datagroup_class: String,
}

impl Default for FixedResources {
    fn default() -> Self {
        Self {
            datagroup_parent_object: "#_f02c26a7-df3d-43a7-9c61-46d382e31d2c".into(),
            privilege_operation: "#_200006fe-0000-0000-c000-0000006d746c".into(),
            dataitem_category: "#_200006ff-0000-0000-c000-0000006d746c".into(),
            datagroup_class: "#_50000709-0000-0000-c000-0000006d746c".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileManagementConfig {
    /// File names (case-insensitive) never offered for conversion.
    pub exclude_files: Vec<String>,
}

impl Default for FileManagementConfig {
    fn default() -> Self {
        Self {
            exclude_files: vec!["Sample.csv".into()],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Log directory, relative paths resolve against the config file location.
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            directory: PathBuf::from("logs"),
        }
    }
}

/// Values remembered between sessions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiState {
    pub last_directory: Option<PathBuf>,
    pub last_folder_uid: Option<String>,
}

impl AppConfig {
    /// `config.json` beside the running executable, or in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Load the configuration at `path`. `None` when no file exists there.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write config file {:?}", path))
    }

    /// Store `state` as the `ui` section of the file at `path`.
    ///
    /// Every other key stays as the user wrote it, and a file that does not
    /// parse as a JSON object is left untouched. Without a file, `self` is
    /// written with `state` as its `ui` section.
    pub fn save_ui_state(&self, path: &Path, state: &UiState) -> Result<()> {
        if !path.exists() {
            let mut config = self.clone();
            config.ui = state.clone();
            return config.save(path);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let mut document: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Config file {:?} is not valid JSON, not overwriting it", path))?;
        let Some(object) = document.as_object_mut() else {
            bail!("Config file {:?} is not a JSON object, not overwriting it", path);
        };
        object.insert("ui".to_string(), serde_json::to_value(state)?);
        let json = serde_json::to_string_pretty(&document)?;
        fs::write(path, json).with_context(|| format!("Failed to write config file {:?}", path))
    }

    /// Reject settings the reader and writer cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.csv_processing.delimiter()?;
        if !self.xml_generation.namespaces.contains_key("rdf") {
            bail!("xml_generation.namespaces must define the 'rdf' prefix");
        }
        Ok(())
    }

    /// Resolve the log directory relative to the directory holding the config.
    pub fn log_directory(&self, config_path: &Path) -> PathBuf {
        let dir = &self.logging.directory;
        if dir.is_absolute() {
            return dir.clone();
        }
        config_path
            .parent()
            .map(|base| base.join(dir))
            .unwrap_or_else(|| dir.clone())
    }
}

impl CsvProcessingConfig {
    /// Delimiter as a single byte.
    pub fn delimiter(&self) -> Result<u8> {
        match self.default_delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => bail!(
                "csv_processing.default_delimiter must be a single ASCII character, got {:?}",
                self.default_delimiter
            ),
        }
    }

    /// Required fields normalized the same way as CSV headers.
    pub fn normalized_required_fields(&self) -> Vec<String> {
        self.required_fields
            .iter()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect()
    }
}
