//! Authenticated request plumbing for the REDCap API.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use super::error::RedcapError;
use crate::http::{HttpTimeouts, build_http_client};
use crate::params::{RedcapParameters, RedcapReportParameters};

/// Form fields of one API request.
pub type RequestForm = Vec<(&'static str, String)>;

/// Connection to a single REDCap project, authenticated by its API token.
///
/// Every REDCap call is a form-encoded POST to the same endpoint; this type
/// adds the token and response formats and maps failures to [`RedcapError`].
#[derive(Clone)]
pub struct RedcapConnection {
    client: Client,
    url: String,
    token: String,
}

impl std::fmt::Debug for RedcapConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedcapConnection")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl RedcapConnection {
    /// Creates a connection with default HTTP timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`RedcapError::Client`] when the HTTP client cannot be built.
    pub fn create_from(parameters: &RedcapParameters) -> Result<Self, RedcapError> {
        Self::with_timeouts(parameters, HttpTimeouts::default())
    }

    /// Creates a connection with explicit HTTP timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`RedcapError::Client`] when the HTTP client cannot be built.
    pub fn with_timeouts(
        parameters: &RedcapParameters,
        timeouts: HttpTimeouts,
    ) -> Result<Self, RedcapError> {
        let client = build_http_client(timeouts).map_err(|source| RedcapError::Client {
            url: parameters.url.clone(),
            source,
        })?;
        Ok(Self {
            client,
            url: parameters.url.clone(),
            token: parameters.token.clone(),
        })
    }

    /// The REDCap API URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts `data` with the token and formats added.
    ///
    /// The response is returned whatever its status; callers decide how to
    /// treat it.
    ///
    /// # Errors
    ///
    /// Returns [`RedcapError::Connection`] if the request cannot be sent.
    #[instrument(level = "debug", skip(self, data), fields(url = %self.url))]
    pub async fn post_request(
        &self,
        mut data: RequestForm,
        result_format: Option<&str>,
        error_format: &str,
    ) -> Result<Response, RedcapError> {
        data.push(("token", self.token.clone()));
        data.push(("returnFormat", error_format.to_string()));
        if let Some(format) = result_format {
            data.push(("format", format.to_string()));
        }

        let response = self
            .client
            .post(&self.url)
            .form(&data)
            .send()
            .await
            .map_err(|source| RedcapError::connection(&self.url, source))?;
        debug!(status = response.status().as_u16(), "REDCap responded");
        Ok(response)
    }

    /// Posts `data` expecting a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`RedcapError::Http`] for a non-success status and
    /// [`RedcapError::InvalidResponse`] if the body does not decode as `T`.
    pub async fn request_json_value<T: DeserializeOwned>(
        &self,
        data: RequestForm,
        message: &str,
    ) -> Result<T, RedcapError> {
        let body = self.request_text_value(data, Some("json"), message).await?;
        serde_json::from_str(&body)
            .map_err(|error| RedcapError::invalid_response(message, error.to_string()))
    }

    /// Posts `data` expecting a text body.
    ///
    /// # Errors
    ///
    /// Returns [`RedcapError::Http`] for a non-success status.
    pub async fn request_text_value(
        &self,
        data: RequestForm,
        result_format: Option<&str>,
        message: &str,
    ) -> Result<String, RedcapError> {
        let response = self.post_request(data, result_format, "json").await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| RedcapError::connection(&self.url, source))?;
        if !status.is_success() {
            return Err(RedcapError::http(message, status, body));
        }
        Ok(body)
    }

    /// Exports the project's field names.
    ///
    /// # Errors
    ///
    /// See [`request_json_value`](Self::request_json_value).
    pub async fn export_field_names(&self) -> Result<Vec<Value>, RedcapError> {
        self.request_json_value(
            vec![("content", "exportFieldNames".to_string())],
            "exporting list of field names",
        )
        .await
    }

    /// Exports the project's basic attributes.
    ///
    /// # Errors
    ///
    /// See [`request_json_value`](Self::request_json_value).
    pub async fn export_project_info(&self) -> Result<Value, RedcapError> {
        self.request_json_value(
            vec![("content", "project".to_string())],
            "exporting project info",
        )
        .await
    }
}

/// Connection scoped to reading one report of a project.
#[derive(Debug, Clone)]
pub struct RedcapReportConnection {
    connection: RedcapConnection,
    report_id: String,
}

impl RedcapReportConnection {
    /// Creates a report connection with default HTTP timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`RedcapError::Client`] when the HTTP client cannot be built.
    pub fn create_from(parameters: &RedcapReportParameters) -> Result<Self, RedcapError> {
        Ok(Self::new(
            RedcapConnection::create_from(&parameters.project())?,
            parameters.report_id.clone(),
        ))
    }

    #[must_use]
    pub fn new(connection: RedcapConnection, report_id: impl Into<String>) -> Self {
        Self {
            connection,
            report_id: report_id.into(),
        }
    }

    #[must_use]
    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    /// The underlying project connection.
    #[must_use]
    pub fn connection(&self) -> &RedcapConnection {
        &self.connection
    }

    /// Reads every record of the report with raw values and headers.
    ///
    /// # Errors
    ///
    /// See [`RedcapConnection::request_json_value`].
    pub async fn get_report_records(
        &self,
    ) -> Result<Vec<serde_json::Map<String, Value>>, RedcapError> {
        let message = format!("pulling report id {}", self.report_id);
        let data = vec![
            ("content", "report".to_string()),
            ("report_id", self.report_id.clone()),
            ("csvDelimiter", String::new()),
            ("rawOrLabel", "raw".to_string()),
            ("rawOrLabelHeaders", "raw".to_string()),
            ("exportCheckboxLabel", "false".to_string()),
        ];
        self.connection.request_json_value(data, &message).await
    }
}
