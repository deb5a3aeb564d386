//! Error types for an import run.

use thiserror::Error;

use crate::redcap::RedcapError;
use crate::store::StoreError;

/// Errors that end an import run.
///
/// Per-row and per-file validation problems never show up here; they are
/// logged and collected into [`ImportError::FailedFiles`] at the end of the
/// run.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The target project could not be loaded before any file was read
    #[error("Failed to load REDCap project from {path}: {source}")]
    Setup {
        /// Parameter path of the project
        path: String,
        /// What went wrong
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The object store could not be listed or read
    #[error(transparent)]
    Store(#[from] StoreError),

    /// REDCap rejected or failed an import
    #[error(transparent)]
    Transport(#[from] RedcapError),

    /// A validated batch could not be serialized
    #[error("failed to serialize error checks: {0}")]
    Serialize(#[from] serde_json::Error),

    /// One or more files failed validation or the duplicate check
    #[error("Failed to import the following:\n{}", .files.join("\n"))]
    FailedFiles {
        /// Keys of the failed files, in processing order
        files: Vec<String>,
    },
}

impl ImportError {
    /// Creates a setup error for the project stored under `path`.
    pub fn setup(
        path: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Setup {
            path: path.into(),
            source: source.into(),
        }
    }
}
