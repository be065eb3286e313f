// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Conversion pipeline: CSV rows in, one RDF/XML document out.
//!
//! The XML is streamed into a `.part` sibling and only renamed over the
//! target once the whole document was written, so a failed conversion never
//! leaves a truncated file behind.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::logging::LoggerManager;
use crate::logic::csv_reader::read_rows;
use crate::logic::file_manager::{partial_output_path, xml_output_path};
use crate::logic::xml_generator::XmlGenerator;
use crate::models::report::{FileOutcome, FileReport};
use crate::models::row::{CsvRow, is_valid_uuid};

/// Converts single CSV files according to the loaded configuration.
#[derive(Clone, Debug)]
pub struct CsvProcessor {
    required_fields: Vec<String>,
    delimiter: u8,
    model_version: String,
    model_name: String,
    generator: XmlGenerator,
}

impl CsvProcessor {
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            required_fields: config.csv_processing.normalized_required_fields(),
            delimiter: config.csv_processing.delimiter()?,
            model_version: config.csv_processing.model_version.clone(),
            model_name: config.csv_processing.model_name.clone(),
            generator: XmlGenerator::new(config),
        })
    }

    /// Convert `csv_path` into `xml_path`, parenting every role to `folder_uid`.
    pub fn process_file(&self, folder_uid: &str, csv_path: &Path, xml_path: &Path) -> Result<FileReport> {
        info!("converting {} -> {}", csv_path.display(), xml_path.display());
        if !is_valid_uuid(folder_uid.trim()) {
            bail!("Folder UID is not a valid UUID: '{folder_uid}'");
        }
        let folder_uid = folder_uid.trim();

        let document = read_rows(csv_path, &self.required_fields, self.delimiter)?;
        if !document.skipped.is_empty() {
            let details: Vec<String> = document
                .skipped
                .iter()
                .map(|row| format!("line {}: {}", row.line, row.reason))
                .collect();
            warn!(
                "{} row(s) skipped by validation ({})",
                document.skipped.len(),
                details.join("; ")
            );
        }

        let partial = partial_output_path(xml_path);
        let written = self.write_xml(folder_uid, &document.rows, &partial);
        let roles_written = match written {
            Ok(count) => count,
            Err(err) => {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    debug!("could not remove {}: {cleanup}", partial.display());
                }
                return Err(err);
            }
        };
        fs::rename(&partial, xml_path)
            .with_context(|| format!("Failed to move {:?} into place", xml_path))?;

        info!(roles = roles_written, "XML saved: {}", xml_path.display());
        Ok(FileReport {
            encoding: document.encoding.name(),
            roles_written,
            rows_skipped: document.skipped.len(),
        })
    }

    fn write_xml(&self, folder_uid: &str, rows: &[CsvRow], path: &Path) -> Result<usize> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create XML file {:?}", path))?;
        let mut doc = self.generator.begin(BufWriter::new(file))?;

        let model_uid =
            doc.add_full_model(&self.model_version, &self.model_name, OffsetDateTime::now_utc())?;
        debug!(model = %model_uid, "model header written");
        for row in rows {
            debug!(line = row.line, fields = ?row.keys().collect::<Vec<_>>(), "processing row");
            let ids = doc.add_role_structure(row, folder_uid)?;
            debug!(
                line = row.line,
                role = %ids.role,
                privilege = %ids.privilege,
                datagroup = %ids.datagroup,
                object_reference = %ids.object_reference,
                "role structure written"
            );
        }

        let mut out = doc.finish()?;
        out.flush()
            .with_context(|| format!("Failed to flush XML file {:?}", path))?;
        Ok(rows.len())
    }
}

/// Converts a list of CSV files from one directory, each under its own log.
#[derive(Clone, Debug)]
pub struct BatchProcessor {
    processor: CsvProcessor,
    loggers: LoggerManager,
}

impl BatchProcessor {
    pub fn new(processor: CsvProcessor, loggers: LoggerManager) -> Self {
        Self { processor, loggers }
    }

    /// Convert one file of `csv_dir`; the XML lands next to it as `<stem>.xml`.
    pub fn process_one(&self, folder_uid: &str, csv_dir: &Path, csv_name: &str) -> FileOutcome {
        let csv_path = csv_dir.join(csv_name);
        let xml_path = xml_output_path(csv_dir, csv_name);

        let result = self.loggers.in_file_scope(csv_name, || {
            info!("start processing {csv_name}");
            let result = self.processor.process_file(folder_uid, &csv_path, &xml_path);
            match &result {
                Ok(report) => info!(
                    roles = report.roles_written,
                    skipped = report.rows_skipped,
                    "finished {csv_name}: success"
                ),
                Err(err) => error!("finished {csv_name}: failed: {err:#}"),
            }
            result
        });

        FileOutcome {
            csv_name: csv_name.to_string(),
            xml_path,
            result: result.map_err(|err| format!("{err:#}")),
        }
    }

    /// Convert every file in `files`; failures are reported per file and never stop the batch.
    pub fn process_files(&self, folder_uid: &str, csv_dir: &Path, files: &[String]) -> Vec<FileOutcome> {
        files
            .iter()
            .map(|name| self.process_one(folder_uid, csv_dir, name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::field_reassign_with_default)]

    use super::*;
    use tempfile::TempDir;

    const FOLDER: &str = "3f2a9c1e-7b4d-4e8a-a1c5-9d0e6b2f4a77";
    const UID_A: &str = "8d3c7f0e-2a41-4b6e-9f1d-5c2b8a7e4d10";
    const UID_B: &str = "0b7e4f7a-91c2-4d7f-8e55-2a6c3d9b1f22";

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.csv_processing.required_fields = vec!["org_name".into(), "object_uid".into()];
        config
    }

    fn batch(tmp: &TempDir) -> BatchProcessor {
        BatchProcessor::new(
            CsvProcessor::new(&config()).unwrap(),
            LoggerManager::new(tmp.path().join("logs"), "info"),
        )
    }

    #[test]
    fn process_file_writes_one_structure_per_valid_row() {
        let tmp = TempDir::new().unwrap();
        let csv = tmp.path().join("roles.csv");
        let xml = tmp.path().join("roles.xml");
        fs::write(
            &csv,
            format!("ORG_NAME;Object_UID\nАлфа;{UID_A}\n;{UID_B}\nБета;{UID_B}\n"),
        )
        .unwrap();

        let report = CsvProcessor::new(&config())
            .unwrap()
            .process_file(FOLDER, &csv, &xml)
            .unwrap();

        assert_eq!(report.roles_written, 2);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.encoding, "UTF-8");
        let content = fs::read_to_string(&xml).unwrap();
        assert_eq!(content.matches("<cim:Role ").count(), 2);
        assert_eq!(content.matches("<md:FullModel ").count(), 1);
        assert!(content.contains("Роль Алфа"));
        assert!(content.contains("Группа Бета"));
        assert!(!partial_output_path(&xml).exists());
    }

    #[test]
    fn process_file_rejects_invalid_folder_uid_before_reading() {
        let tmp = TempDir::new().unwrap();
        let xml = tmp.path().join("out.xml");

        let err = CsvProcessor::new(&config())
            .unwrap()
            .process_file("folder", &tmp.path().join("absent.csv"), &xml)
            .unwrap_err();

        assert!(err.to_string().contains("Folder UID"));
        assert!(!xml.exists());
    }

    #[test]
    fn failed_generation_leaves_no_output() {
        let tmp = TempDir::new().unwrap();
        let csv = tmp.path().join("roles.csv");
        let xml = tmp.path().join("roles.xml");
        // No required fields configured and no `_uid` column: generation must fail.
        fs::write(&csv, "org_name;comment\nАлфа;x\n").unwrap();
        let mut cfg = AppConfig::default();
        cfg.csv_processing.required_fields = vec!["org_name".into()];

        let result = CsvProcessor::new(&cfg)
            .unwrap()
            .process_file(FOLDER, &csv, &xml);

        assert!(result.is_err());
        assert!(!xml.exists());
        assert!(!partial_output_path(&xml).exists());
    }

    #[test]
    fn empty_csv_still_produces_model_header() {
        let tmp = TempDir::new().unwrap();
        let csv = tmp.path().join("empty.csv");
        let xml = tmp.path().join("empty.xml");
        fs::write(&csv, "org_name;object_uid\n").unwrap();

        let report = CsvProcessor::new(&config())
            .unwrap()
            .process_file(FOLDER, &csv, &xml)
            .unwrap();

        assert_eq!(report.roles_written, 0);
        assert!(fs::read_to_string(&xml).unwrap().contains("md:FullModel"));
    }

    #[test]
    fn windows_1251_input_is_converted() {
        let tmp = TempDir::new().unwrap();
        let csv = tmp.path().join("cp1251.csv");
        let xml = tmp.path().join("cp1251.xml");
        let text = format!(
            "org_name;object_uid\nОтдел снабжения и логистики;{UID_A}\nБухгалтерия и финансовый отдел;{UID_B}\n"
        );
        let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(&text);
        fs::write(&csv, &bytes).unwrap();

        let report = CsvProcessor::new(&config())
            .unwrap()
            .process_file(FOLDER, &csv, &xml)
            .unwrap();

        assert_eq!(report.roles_written, 2);
        assert!(fs::read_to_string(&xml).unwrap().contains("Роль Бухгалтерия и финансовый отдел"));
    }

    #[test]
    fn batch_reports_each_file_and_writes_logs() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("good.csv"),
            format!("org_name;object_uid\nАлфа;{UID_A}\n"),
        )
        .unwrap();
        fs::write(tmp.path().join("bad.csv"), "org_name;note\nАлфа;x\n").unwrap();

        let outcomes = batch(&tmp).process_files(
            FOLDER,
            tmp.path(),
            &["bad.csv".to_string(), "good.csv".to_string()],
        );

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_ok(), "rows without required fields are skipped, not fatal");
        assert_eq!(outcomes[0].result.as_ref().unwrap().roles_written, 0);
        assert!(outcomes[1].result.is_ok());
        assert_eq!(outcomes[1].xml_path, tmp.path().join("good.xml"));
        assert!(tmp.path().join("good.xml").exists());
        assert!(tmp.path().join("logs").join("good.log").exists());
        assert!(tmp.path().join("logs").join("bad.log").exists());
    }

    #[test]
    fn batch_continues_after_missing_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("ok.csv"),
            format!("org_name;object_uid\nАлфа;{UID_A}\n"),
        )
        .unwrap();

        let outcomes = batch(&tmp).process_files(
            FOLDER,
            tmp.path(),
            &["gone.csv".to_string(), "ok.csv".to_string()],
        );

        assert!(outcomes[0].result.is_err());
        assert!(outcomes[1].result.is_ok());
    }
}
