// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Conversion results reported back to the UI.

use std::path::PathBuf;

/// Summary of a successfully converted CSV file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileReport {
    /// Encoding the CSV was decoded with.
    pub encoding: &'static str,
    /// Role structures written to the XML.
    pub roles_written: usize,
    /// Rows rejected by validation.
    pub rows_skipped: usize,
}

/// Per-file result of a batch run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileOutcome {
    pub csv_name: String,
    pub xml_path: PathBuf,
    pub result: Result<FileReport, String>,
}

impl FileOutcome {
    /// One-line human readable status.
    pub fn summary(&self) -> String {
        match &self.result {
            Ok(report) if report.rows_skipped > 0 => format!(
                "{}: {} role(s), {} row(s) skipped",
                self.csv_name, report.roles_written, report.rows_skipped
            ),
            Ok(report) => format!("{}: {} role(s)", self.csv_name, report.roles_written),
            Err(err) => format!("{}: failed ({err})", self.csv_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_skipped_rows_only_when_present() {
        let mut outcome = FileOutcome {
            csv_name: "a.csv".into(),
            xml_path: PathBuf::from("a.xml"),
            result: Ok(FileReport {
                encoding: "UTF-8",
                roles_written: 3,
                rows_skipped: 0,
            }),
        };
        assert_eq!(outcome.summary(), "a.csv: 3 role(s)");

        if let Ok(report) = outcome.result.as_mut() {
            report.rows_skipped = 2;
        }
        assert_eq!(outcome.summary(), "a.csv: 3 role(s), 2 row(s) skipped");
    }

    #[test]
    fn failed_outcome_summary_carries_error() {
        let outcome = FileOutcome {
            csv_name: "b.csv".into(),
            xml_path: PathBuf::from("b.xml"),
            result: Err("boom".into()),
        };

        assert!(outcome.result.is_err());
        assert_eq!(outcome.summary(), "b.csv: failed (boom)");
    }
}
