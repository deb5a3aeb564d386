//! Error types for parameter (credential) retrieval.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading stored parameters.
#[derive(Debug, Error)]
pub enum ParameterError {
    /// The parameter file could not be read
    #[error("failed to read parameters from {path}: {source}\n  Suggestion: {suggestion}")]
    Io {
        /// The parameter file path
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
        /// How to fix the issue
        suggestion: &'static str,
    },

    /// The parameter file is not valid JSON of the expected shape
    #[error("failed to parse parameters from {path}: {source}")]
    Parse {
        /// The parameter file path
        path: PathBuf,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The requested profile has no entry
    #[error("profile '{profile}' not found in parameter store")]
    ProfileNotFound {
        /// The requested profile
        profile: String,
    },

    /// Nothing is stored under the requested path
    #[error("no parameters stored under '{path}' for profile '{profile}'")]
    ParameterNotFound {
        /// The requested profile
        profile: String,
        /// The requested parameter path
        path: String,
    },

    /// A required field is missing from the stored parameters
    #[error("parameter '{field}' missing under '{path}'")]
    MissingField {
        /// The parameter path that was read
        path: String,
        /// The missing field name
        field: &'static str,
    },
}

impl ParameterError {
    /// Creates an IO error for a parameter file.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let suggestion = if source.kind() == std::io::ErrorKind::NotFound {
            "Pass --parameters-file or create the default parameters.json"
        } else {
            "Check the file permissions"
        };
        Self::Io {
            path: path.into(),
            source,
            suggestion,
        }
    }
}
