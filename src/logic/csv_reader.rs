// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! CSV loading: encoding detection with fallbacks, header normalization and row validation.
//!
//! Field semantics are not interpreted here; the caller supplies the list of
//! required columns from configuration.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1251};
use tracing::{debug, error, info, warn};

use crate::models::row::{CsvRow, check_required_fields};

/// Rows accepted from a CSV file together with decoding details.
#[derive(Debug)]
pub struct CsvDocument {
    /// Encoding the text was finally decoded with.
    pub encoding: &'static Encoding,
    /// Rows that passed validation, in file order.
    pub rows: Vec<CsvRow>,
    /// Rows rejected by validation.
    pub skipped: Vec<SkippedRow>,
}

/// A rejected row and the reason it was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

/// Decoded text plus the encoding that produced it.
#[derive(Debug)]
pub struct Decoded<'a> {
    pub text: Cow<'a, str>,
    pub encoding: &'static Encoding,
}

/// Guess the encoding of raw file bytes.
///
/// A byte-order mark wins outright. Otherwise the statistical detector is
/// consulted and UTF-8 is assumed when it is not confident.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let (encoding, confident) = detector.guess_assess(None, true);
    if confident { encoding } else { UTF_8 }
}

/// Decode `bytes` strictly with `detected`, falling back to windows-1251.
///
/// windows-1251 assigns a character to every byte value, so the fallback
/// always succeeds and the text never contains replacement characters.
pub fn decode<'a>(bytes: &'a [u8], detected: &'static Encoding) -> Decoded<'a> {
    let body = strip_bom(bytes, detected);
    if let Some(text) = detected.decode_without_bom_handling_and_without_replacement(body) {
        return Decoded {
            text,
            encoding: detected,
        };
    }

    warn!(
        encoding = detected.name(),
        "could not decode file strictly, falling back to windows-1251"
    );
    let (text, _) = WINDOWS_1251.decode_without_bom_handling(bytes);
    Decoded {
        text,
        encoding: WINDOWS_1251,
    }
}

fn strip_bom<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> &'a [u8] {
    match Encoding::for_bom(bytes) {
        Some((bom_encoding, len)) if bom_encoding == encoding => &bytes[len..],
        _ => bytes,
    }
}

/// Read `path`, decode it and return the rows that satisfy `required_fields`.
///
/// Header names and row keys are trimmed and lowercased. Rows failing
/// validation, or failing to parse, are logged and skipped.
pub fn read_rows(path: &Path, required_fields: &[String], delimiter: u8) -> Result<CsvDocument> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read CSV file {:?}", path))?;
    let detected = detect_encoding(&bytes);
    debug!(encoding = detected.name(), "detected encoding");

    let decoded = decode(&bytes, detected);
    info!(encoding = decoded.encoding.name(), "file opened");

    let (rows, skipped) = parse_rows(&decoded.text, required_fields, delimiter)
        .with_context(|| format!("Failed to parse CSV file {:?}", path))?;

    Ok(CsvDocument {
        encoding: decoded.encoding,
        rows,
        skipped,
    })
}

/// Parse already decoded CSV text into validated rows.
pub fn parse_rows(
    text: &str,
    required_fields: &[String],
    delimiter: u8,
) -> Result<(Vec<CsvRow>, Vec<SkippedRow>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let fallback_line = index as u64 + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                let line = err
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line);
                error!(line, "unparseable CSV record: {err}");
                skipped.push(SkippedRow {
                    line,
                    reason: err.to_string(),
                });
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(fallback_line);

        // Extra trailing values without a header are dropped.
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();
        let row = CsvRow::new(line, fields);

        match check_required_fields(&row, required_fields) {
            Ok(()) => rows.push(row),
            Err(err) => {
                error!(line, data = ?row.fields(), "row rejected: {err}");
                skipped.push(SkippedRow {
                    line,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok((rows, skipped))
}

fn normalize_header(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const UID_A: &str = "8d3c7f0e-2a41-4b6e-9f1d-5c2b8a7e4d10";
    const UID_B: &str = "0b7e4f7a-91c2-4d7f-8e55-2a6c3d9b1f22";

    fn required() -> Vec<String> {
        vec!["org_name".into(), "object_uid".into()]
    }

    #[test]
    fn parse_rows_normalizes_headers_and_keeps_valid_rows() {
        let text = format!(" Org_Name ;OBJECT_UID\nAlpha;{UID_A}\nBeta;{UID_B}\n");

        let (rows, skipped) = parse_rows(&text, &required(), b';').unwrap();

        assert!(skipped.is_empty());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("org_name"), Some("Alpha"));
        assert_eq!(rows[1].get("object_uid"), Some(UID_B));
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn parse_rows_skips_invalid_rows_with_line_numbers() {
        let text = format!("org_name;object_uid\nAlpha;{UID_A}\n;{UID_B}\nGamma;broken\n");

        let (rows, skipped) = parse_rows(&text, &required(), b';').unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].line, 3);
        assert!(skipped[0].reason.contains("org_name"));
        assert_eq!(skipped[1].line, 4);
        assert!(skipped[1].reason.contains("UUID"));
    }

    #[test]
    fn parse_rows_treats_short_records_as_missing_fields() {
        let text = "org_name;object_uid\nAlpha\n";

        let (rows, skipped) = parse_rows(text, &required(), b';').unwrap();

        assert!(rows.is_empty());
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn parse_rows_honours_quoted_delimiters() {
        let text = format!("org_name;object_uid\n\"Alpha; Inc\";{UID_A}\n");

        let (rows, _) = parse_rows(&text, &required(), b';').unwrap();

        assert_eq!(rows[0].get("org_name"), Some("Alpha; Inc"));
    }

    #[test]
    fn decode_falls_back_to_windows_1251() {
        // "Роль" in windows-1251 is not valid UTF-8.
        let bytes = [0xD0, 0xEE, 0xEB, 0xFC];

        let decoded = decode(&bytes, UTF_8);

        assert_eq!(decoded.encoding, WINDOWS_1251);
        assert_eq!(decoded.text, "Роль");
    }

    #[test]
    fn decode_fallback_maps_every_byte_without_replacement() {
        // 0x98 has no cp1251 letter but is still a valid windows-1251 byte.
        let bytes = [0x98, 0xC0, 0xFF];

        let decoded = decode(&bytes, UTF_8);

        assert_eq!(decoded.encoding, WINDOWS_1251);
        assert_eq!(decoded.text.chars().count(), 3);
        assert!(!decoded.text.contains('\u{fffd}'));
        assert!(decoded.text.ends_with("Ая"));
    }

    #[test]
    fn decode_strips_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("org_name".as_bytes());

        let decoded = decode(&bytes, detect_encoding(&bytes));

        assert_eq!(decoded.encoding, UTF_8);
        assert_eq!(decoded.text, "org_name");
    }

    #[test]
    fn detect_encoding_recognizes_utf8_cyrillic() {
        let text = "Подразделение;Описание\nОтдел продаж;Работа с клиентами\n".repeat(4);

        assert_eq!(detect_encoding(text.as_bytes()), UTF_8);
    }

    #[test]
    fn read_rows_reports_encoding_and_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("roles.csv");
        fs::write(
            &path,
            format!("org_name;object_uid\nОтдел кадров;{UID_A}\n"),
        )
        .unwrap();

        let doc = read_rows(&path, &required(), b';').unwrap();

        assert_eq!(doc.encoding, UTF_8);
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.rows[0].get("org_name"), Some("Отдел кадров"));
    }

    #[test]
    fn read_rows_errors_on_missing_file() {
        let tmp = TempDir::new().unwrap();

        assert!(read_rows(&tmp.path().join("absent.csv"), &required(), b';').is_err());
    }
}
