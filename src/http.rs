//! Shared HTTP client construction policy.
//!
//! The REDCap transport and the HTTP object store build their clients here
//! so timeouts, user-agent and compression stay consistent.

use std::time::Duration;

use reqwest::Client;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes; large imports can be slow to answer).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Connect/read timeouts applied to every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// User-Agent sent with every request.
#[must_use]
pub fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Builds an HTTP client using the shared policy.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] when the client cannot be built
/// (for example when no TLS backend can be initialised).
pub fn build_http_client(timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_timeout_secs))
        .timeout(Duration::from_secs(timeouts.read_timeout_secs))
        .user_agent(user_agent())
        .gzip(true)
        .build()
}
