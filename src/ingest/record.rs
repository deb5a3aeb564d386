//! Row and record shapes flowing through error check validation.

use serde::{Deserialize, Serialize};

/// Columns every error check CSV must provide.
///
/// `error_no`, `do_in_redcap`, `in_prev_versions`, `questions` and any other
/// extra columns are accepted but never imported.
pub const REQUIRED_HEADERS: [&str; 12] = [
    "error_code",
    "error_type",
    "form_name",
    "packet",
    "var_name",
    "check_type",
    "test_name",
    "short_desc",
    "full_desc",
    "test_logic",
    "comp_forms",
    "comp_vars",
];

/// Required columns that may hold an empty value.
pub const ALLOWED_EMPTY_FIELDS: [&str; 2] = ["comp_forms", "comp_vars"];

/// Column that may be absent for packet-less (enrollment) files.
pub const PACKET_FIELD: &str = "packet";

/// Returns true if `field` is one of [`REQUIRED_HEADERS`].
#[must_use]
pub fn is_required_header(field: &str) -> bool {
    REQUIRED_HEADERS.contains(&field)
}

/// One CSV data row, keyed by header name in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    fields: Vec<(String, String)>,
}

impl CsvRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column value. A repeated header keeps its first value on lookup.
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.push((field.into(), value.into()));
    }

    /// Value of the named column, if the row has it.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Iterates `(field, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CsvRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        }
    }
}

/// A validated error check, ready to be imported as a REDCap record.
///
/// Field order matches [`REQUIRED_HEADERS`] so serialized batches keep the
/// column order of the source files. `packet` is omitted for enrollment
/// error checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCheckRecord {
    pub error_code: String,
    pub error_type: String,
    pub form_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet: Option<String>,
    pub var_name: String,
    pub check_type: String,
    pub test_name: String,
    pub short_desc: String,
    pub full_desc: String,
    pub test_logic: String,
    pub comp_forms: String,
    pub comp_vars: String,
}

impl ErrorCheckRecord {
    /// Projects a row onto the required fields, dropping every other column.
    ///
    /// # Errors
    ///
    /// Returns the name of the first required column (other than `packet`)
    /// the row does not carry.
    pub fn from_row(row: &CsvRow) -> Result<Self, &'static str> {
        let field = |name: &'static str| row.get(name).map(str::to_string).ok_or(name);

        Ok(Self {
            error_code: field("error_code")?,
            error_type: field("error_type")?,
            form_name: field("form_name")?,
            packet: row.get(PACKET_FIELD).map(str::to_string),
            var_name: field("var_name")?,
            check_type: field("check_type")?,
            test_name: field("test_name")?,
            short_desc: field("short_desc")?,
            full_desc: field("full_desc")?,
            test_logic: field("test_logic")?,
            comp_forms: field("comp_forms")?,
            comp_vars: field("comp_vars")?,
        })
    }
}
