//! A REDCap project and the record import operation.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::connection::RedcapConnection;
use super::error::RedcapError;

/// Destination for validated error check batches.
#[async_trait]
pub trait RecordImporter: Send + Sync {
    /// Imports a JSON array of records, returning how many were accepted.
    async fn import_records(&self, records: &str) -> Result<usize, RedcapError>;
}

/// A REDCap project reachable through a [`RedcapConnection`].
#[derive(Debug, Clone)]
pub struct RedcapProject {
    connection: RedcapConnection,
    pid: u64,
    title: String,
    primary_key_field: String,
}

impl RedcapProject {
    /// Loads the project behind `connection`.
    ///
    /// Exports the project info and field names, which also proves the token
    /// works before any file is processed.
    ///
    /// # Errors
    ///
    /// Returns [`RedcapError`] if either export fails or the project info
    /// carries no project id.
    #[instrument(level = "debug", skip(connection), fields(url = %connection.url()))]
    pub async fn create(connection: RedcapConnection) -> Result<Self, RedcapError> {
        let info = connection.export_project_info().await?;
        let field_names = connection.export_field_names().await?;

        let pid = info
            .get("project_id")
            .and_then(value_as_u64)
            .ok_or_else(|| {
                RedcapError::invalid_response("exporting project info", "missing project_id")
            })?;
        let title = info
            .get("project_title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let primary_key_field = field_names
            .first()
            .and_then(|field| field.get("export_field_name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        info!(pid, title = %title, "Connected to REDCap project");
        Ok(Self {
            connection,
            pid,
            title,
            primary_key_field,
        })
    }

    #[must_use]
    pub fn pid(&self) -> u64 {
        self.pid
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Name of the record identifier field (the first exported field).
    #[must_use]
    pub fn primary_key_field(&self) -> &str {
        &self.primary_key_field
    }

    /// Imports records given as a `data_format` (`json` or `csv`) string.
    ///
    /// # Errors
    ///
    /// Returns [`RedcapError::Http`] if REDCap rejects the import and
    /// [`RedcapError::InvalidResponse`] if the reply carries no count.
    #[instrument(level = "debug", skip(self, records), fields(pid = self.pid))]
    pub async fn import_records_as(&self, records: &str, data_format: &str) -> Result<usize, RedcapError> {
        let message = "importing records";
        let data = vec![
            ("content", "record".to_string()),
            ("action", "import".to_string()),
            ("forceAutoNumber", "false".to_string()),
            ("data", records.to_string()),
            ("returnContent", "count".to_string()),
        ];

        let body = self
            .connection
            .request_text_value(data, Some(&data_format.to_lowercase()), message)
            .await?;
        let count = parse_import_count(&body)
            .ok_or_else(|| RedcapError::invalid_response(message, body.clone()))?;
        debug!(count, "REDCap accepted records");
        Ok(count)
    }
}

#[async_trait]
impl RecordImporter for RedcapProject {
    async fn import_records(&self, records: &str) -> Result<usize, RedcapError> {
        self.import_records_as(records, "json").await
    }
}

/// Reads `{"count": n}`, where REDCap may send `n` as a number or a string.
fn parse_import_count(body: &str) -> Option<usize> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("count")
        .and_then(value_as_u64)
        .and_then(|count| usize::try_from(count).ok())
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_count_number() {
        assert_eq!(parse_import_count(r#"{"count": 12}"#), Some(12));
    }

    #[test]
    fn test_parse_import_count_string() {
        assert_eq!(parse_import_count(r#"{"count": "3"}"#), Some(3));
    }

    #[test]
    fn test_parse_import_count_rejects_other_shapes() {
        assert_eq!(parse_import_count("12"), None);
        assert_eq!(parse_import_count(r#"{"ids": ["a"]}"#), None);
        assert_eq!(parse_import_count(r#"{"count": -1}"#), None);
        assert_eq!(parse_import_count("not json"), None);
    }
}
