// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! CSV row domain model and required-field validation (IO-free).

use thiserror::Error;
use uuid::Uuid;

/// One data row with normalized (trimmed, lowercased) column names in header order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvRow {
    /// Physical line in the source file where the record starts (header is line 1).
    pub line: u64,
    fields: Vec<(String, String)>,
}

/// Why a row was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("field '{0}' is missing or empty")]
    MissingField(String),
    #[error("field '{field}' is not a valid UUID: '{value}'")]
    InvalidUuid { field: String, value: String },
}

impl CsvRow {
    pub fn new(line: u64, fields: Vec<(String, String)>) -> Self {
        Self { line, fields }
    }

    /// Value of `key`; when a header repeats, the last column wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Column names in header order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// First column whose name contains `_uid`, with its value.
    pub fn object_uid(&self) -> Option<(&str, &str)> {
        let key = self.keys().find(|k| is_uid_field(k))?;
        self.get(key).map(|value| (key, value))
    }
}

/// Columns named like `*_uid*` carry object identifiers and must parse as UUIDs.
pub fn is_uid_field(name: &str) -> bool {
    name.to_lowercase().contains("_uid")
}

/// Accepts hyphenated, simple, braced and `urn:uuid:` forms.
pub fn is_valid_uuid(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}

/// Fresh random identifier in lowercase hyphenated form.
pub fn gen_uid() -> String {
    Uuid::new_v4().to_string()
}

/// Check every required field is present, non-blank and, for `_uid` fields, a UUID.
pub fn check_required_fields(row: &CsvRow, required: &[String]) -> Result<(), RowError> {
    for field in required {
        let value = row.get(field).map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(RowError::MissingField(field.clone()));
        }
        if is_uid_field(field) && !is_valid_uuid(value) {
            return Err(RowError::InvalidUuid {
                field: field.clone(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> CsvRow {
        CsvRow::new(
            2,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn required(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn accepts_row_with_all_required_fields() {
        let r = row(&[
            ("org_name", "Филиал"),
            ("object_uid", "8d3c7f0e-2a41-4b6e-9f1d-5c2b8a7e4d10"),
        ]);

        assert!(check_required_fields(&r, &required(&["org_name", "object_uid"])).is_ok());
    }

    #[test]
    fn rejects_blank_required_field() {
        let r = row(&[("org_name", "   ")]);

        assert_eq!(
            check_required_fields(&r, &required(&["org_name"])),
            Err(RowError::MissingField("org_name".into()))
        );
    }

    #[test]
    fn rejects_absent_required_field() {
        let r = row(&[("other", "x")]);

        assert!(matches!(
            check_required_fields(&r, &required(&["org_name"])),
            Err(RowError::MissingField(_))
        ));
    }

    #[test]
    fn rejects_malformed_uid_field() {
        let r = row(&[("object_uid", "not-a-uuid")]);

        assert_eq!(
            check_required_fields(&r, &required(&["object_uid"])),
            Err(RowError::InvalidUuid {
                field: "object_uid".into(),
                value: "not-a-uuid".into(),
            })
        );
    }

    #[test]
    fn uuid_check_accepts_alternative_forms() {
        assert!(is_valid_uuid("8d3c7f0e2a414b6e9f1d5c2b8a7e4d10"));
        assert!(is_valid_uuid("{8d3c7f0e-2a41-4b6e-9f1d-5c2b8a7e4d10}"));
        assert!(is_valid_uuid("urn:uuid:8d3c7f0e-2a41-4b6e-9f1d-5c2b8a7e4d10"));
        assert!(!is_valid_uuid(""));
    }

    #[test]
    fn object_uid_picks_first_uid_column_in_header_order() {
        let r = row(&[
            ("name", "A"),
            ("parent_uid", "11111111-1111-1111-1111-111111111111"),
            ("object_uid", "22222222-2222-2222-2222-222222222222"),
        ]);

        assert_eq!(
            r.object_uid(),
            Some(("parent_uid", "11111111-1111-1111-1111-111111111111"))
        );
        assert_eq!(row(&[("name", "A")]).object_uid(), None);
    }

    #[test]
    fn repeated_header_resolves_to_last_column() {
        let r = row(&[("name", "first"), ("name", "second")]);

        assert_eq!(r.get("name"), Some("second"));
    }

    #[test]
    fn gen_uid_is_valid_and_unique() {
        let a = gen_uid();
        let b = gen_uid();

        assert!(is_valid_uuid(&a));
        assert_ne!(a, b);
        assert_eq!(a, a.to_lowercase());
    }
}
