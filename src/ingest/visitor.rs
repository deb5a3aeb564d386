//! Header and row validation for a single error check CSV file.

use tracing::error;

use super::record::{
    ALLOWED_EMPTY_FIELDS, CsvRow, ErrorCheckRecord, PACKET_FIELD, REQUIRED_HEADERS,
    is_required_header,
};
use crate::key::ErrorCheckKey;

/// Receives the header and rows of a CSV file from [`read_csv`](super::read_csv).
pub trait CsvVisitor {
    /// Checks the header row. Returning false stops the read before any row.
    fn visit_header(&mut self, header: &[String]) -> bool;

    /// Checks one data row. `line_num` is the 1-based line the row starts on.
    fn visit_row(&mut self, row: &CsvRow, line_num: u64) -> bool;
}

/// A single validation failure reported by [`ErrorCheckCsvVisitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Line of the offending row; `None` for header problems.
    pub line_num: Option<u64>,
    pub field: String,
    pub message: String,
}

/// Validates error check CSV content against the file's storage key.
///
/// Rows that pass every check are projected to [`ErrorCheckRecord`]s and kept
/// in file order.
#[derive(Debug)]
pub struct ErrorCheckCsvVisitor {
    key: ErrorCheckKey,
    validated_error_checks: Vec<ErrorCheckRecord>,
    issues: Vec<ValidationIssue>,
}

impl ErrorCheckCsvVisitor {
    #[must_use]
    pub fn new(key: ErrorCheckKey) -> Self {
        Self {
            key,
            validated_error_checks: Vec::new(),
            issues: Vec::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &ErrorCheckKey {
        &self.key
    }

    /// Error checks that passed validation so far.
    #[must_use]
    pub fn validated_error_checks(&self) -> &[ErrorCheckRecord] {
        &self.validated_error_checks
    }

    /// Consumes the visitor, returning the validated error checks.
    #[must_use]
    pub fn into_validated_error_checks(self) -> Vec<ErrorCheckRecord> {
        self.validated_error_checks
    }

    /// Every problem recorded so far, in the order found.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    fn packet_exempt(&self) -> bool {
        self.key.packet().is_none()
    }

    fn missing_header(&mut self, field: &str) {
        error!(key = %self.key, field, "Missing expected header: {field}");
        self.issues.push(ValidationIssue {
            line_num: None,
            field: field.to_string(),
            message: "missing expected header".to_string(),
        });
    }

    fn row_error(&mut self, line_num: u64, field: &str, message: String) {
        error!(key = %self.key, line = line_num, field, "Row {line_num}: Field {field} {message}");
        self.issues.push(ValidationIssue {
            line_num: Some(line_num),
            field: field.to_string(),
            message,
        });
    }
}

impl CsvVisitor for ErrorCheckCsvVisitor {
    /// Every required header must be present; `packet` may be missing only
    /// when the key has no packet.
    fn visit_header(&mut self, header: &[String]) -> bool {
        let mut valid = true;
        for required in REQUIRED_HEADERS {
            if header.iter().any(|name| name == required) {
                continue;
            }
            if required == PACKET_FIELD && self.packet_exempt() {
                continue;
            }
            self.missing_header(required);
            valid = false;
        }
        valid
    }

    fn visit_row(&mut self, row: &CsvRow, line_num: u64) -> bool {
        let mut valid = true;

        let empty_fields: Vec<String> = row
            .iter()
            .filter(|(field, value)| {
                value.is_empty() && is_required_header(field) && !ALLOWED_EMPTY_FIELDS.contains(field)
            })
            .map(|(field, _)| field.to_string())
            .collect();
        for field in empty_fields {
            self.row_error(line_num, &field, "cannot be empty".to_string());
            valid = false;
        }

        let expected_form = self.key.form_name().to_string();
        if row.get("form_name").unwrap_or_default() != expected_form {
            self.row_error(
                line_num,
                "form_name",
                format!("does not match expected form name {expected_form}"),
            );
            valid = false;
        }

        let error_code = row.get("error_code").unwrap_or_default();
        if !error_code.starts_with(&expected_form) {
            self.row_error(
                line_num,
                "error_code",
                format!("does not start with expected form name {expected_form}"),
            );
            valid = false;
        }

        if let Some(expected_packet) = self.key.packet().filter(|packet| !packet.is_empty()) {
            let expected_packet = expected_packet.to_string();

            if let Some(visit_type) = self.key.visit_type()
                && !error_code.contains(visit_type)
            {
                self.row_error(
                    line_num,
                    "error_code",
                    format!("does not have expected visit type {visit_type}"),
                );
                valid = false;
            }

            if row.get(PACKET_FIELD).unwrap_or_default() != expected_packet {
                self.row_error(
                    line_num,
                    PACKET_FIELD,
                    format!("does not match expected packet {expected_packet}"),
                );
                valid = false;
            }
        }

        if !valid {
            return false;
        }

        match ErrorCheckRecord::from_row(row) {
            Ok(record) => {
                self.validated_error_checks.push(record);
                true
            }
            Err(field) => {
                self.row_error(line_num, field, "is missing".to_string());
                false
            }
        }
    }
}
