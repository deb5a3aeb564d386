//! Error types for storage key parsing.

use thiserror::Error;

/// Errors that can occur while parsing an error check storage key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The key does not start with the `CSV` namespace marker
    #[error("Expected CSV at top level of S3 key: {key}")]
    MissingNamespace {
        /// The key that failed to parse
        key: String,
    },

    /// The key has neither the packet nor the enrollment shape
    #[error(
        "Cannot parse ErrorCheckKey components from {key}; Expected to be of the form CSV / MODULE / FORM_VER / PACKET / filename"
    )]
    Malformed {
        /// The key that failed to parse
        key: String,
    },

    /// A packet-less key names a module other than the enrollment module.
    ///
    /// Only the enrollment module is stored without a packet directory, so
    /// this signals a broken bucket layout rather than a bad file.
    #[error("packet-less key {key} must belong to module ENROLL, found {module}")]
    UnexpectedModule {
        /// The key that failed to parse
        key: String,
        /// The module segment that was found
        module: String,
    },
}

impl KeyError {
    /// Returns true for the malformed-key family (as opposed to a layout fault).
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MissingNamespace { .. } | Self::Malformed { .. })
    }
}
