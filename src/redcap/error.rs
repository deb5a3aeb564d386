//! Error types for REDCap API requests.

use thiserror::Error;

/// Errors that can occur while talking to a REDCap project.
#[derive(Debug, Error)]
pub enum RedcapError {
    /// Network-level failure (DNS, refused connection, TLS, timeout)
    #[error("Error connecting to {url} - {source}")]
    Connection {
        /// The REDCap API URL
        url: String,
        /// The underlying network error
        #[source]
        source: reqwest::Error,
    },

    /// REDCap answered with a non-success HTTP status
    #[error("Error: {message}\nHTTP Error:{status} {reason}: {body}")]
    Http {
        /// What was being requested
        message: String,
        /// The HTTP status code
        status: u16,
        /// The canonical reason phrase for the status
        reason: String,
        /// The response body (REDCap puts its error text here)
        body: String,
    },

    /// REDCap answered successfully but the body is not what was asked for
    #[error("Error: {message}: unexpected response {detail}")]
    InvalidResponse {
        /// What was being requested
        message: String,
        /// Why the body was rejected
        detail: String,
    },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client for {url}: {source}")]
    Client {
        /// The REDCap API URL
        url: String,
        /// The underlying builder error
        #[source]
        source: reqwest::Error,
    },
}

impl RedcapError {
    /// Creates a connection error.
    pub fn connection(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Connection {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error from the status code and body.
    pub fn http(message: impl Into<String>, status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            body: body.into(),
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_includes_status_reason_and_body() {
        let err = RedcapError::http(
            "importing records",
            reqwest::StatusCode::FORBIDDEN,
            r#"{"error":"You do not have permissions"}"#,
        );
        assert_eq!(
            err.to_string(),
            "Error: importing records\nHTTP Error:403 Forbidden: {\"error\":\"You do not have permissions\"}"
        );
    }

    #[test]
    fn test_invalid_response_message() {
        let err = RedcapError::invalid_response("importing records", "missing count");
        let msg = err.to_string();
        assert!(msg.contains("importing records"));
        assert!(msg.contains("missing count"));
    }
}
