// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Filesystem helpers: discovering CSV inputs and deriving output/log paths.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::utils::sanitize_component;

/// CSV file names in `dir` (case-insensitive `.csv`), minus `exclude`, sorted.
pub fn list_csv_files(dir: &Path, exclude: &[String]) -> Result<Vec<String>> {
    let excluded: Vec<String> = exclude.iter().map(|f| f.to_lowercase()).collect();
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list directory {:?}", dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {:?}", dir))?;
        if !entry.path().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") && !excluded.contains(&lower) {
            files.push(name);
        }
    }
    files.sort_by_key(|name| name.to_lowercase());
    Ok(files)
}

/// `<dir>/<stem>.xml` for a CSV file name.
pub fn xml_output_path(dir: &Path, csv_name: &str) -> PathBuf {
    let stem = Path::new(csv_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(csv_name);
    dir.join(format!("{stem}.xml"))
}

/// Sibling path the XML is streamed into before it replaces the target.
pub fn partial_output_path(xml_path: &Path) -> PathBuf {
    let mut name = xml_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    xml_path.with_file_name(name)
}

/// Log file name for a CSV input: sanitized stem with a `.log` extension.
pub fn log_file_name(csv_name: &str) -> String {
    let stem = Path::new(csv_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(csv_name);
    format!("{}.log", sanitize_component(stem))
}

/// Create `path` and its parents when missing.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
    }
    Ok(())
}
