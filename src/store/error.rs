//! Error types for object store access.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while listing or reading objects.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Local filesystem error
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The path that failed
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Network-level error talking to the store
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The request URL
        url: String,
        /// The underlying network error
        #[source]
        source: reqwest::Error,
    },

    /// The store answered with a non-success HTTP status
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The request URL
        url: String,
        /// The HTTP status code
        status: u16,
    },

    /// A listing response could not be understood
    #[error("invalid listing from {url}: {reason}")]
    InvalidListing {
        /// The request URL
        url: String,
        /// Why the listing was rejected
        reason: String,
    },

    /// The endpoint cannot address objects
    #[error("invalid store endpoint '{endpoint}': {reason}\n  Suggestion: Use an http:// or https:// bucket URL")]
    InvalidEndpoint {
        /// The configured endpoint
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },

    /// The key cannot be mapped to an object
    #[error("invalid object key '{key}'")]
    InvalidKey {
        /// The rejected key
        key: String,
    },
}

impl StoreError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid-listing error.
    pub fn invalid_listing(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidListing {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-endpoint error.
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}
