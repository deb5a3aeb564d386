//! Parameter (credential) retrieval for the target REDCap project.
//!
//! Credentials are looked up by a profile name and a parameter path such as
//! `/redcap/aws/qcchecks/`. [`FileParameterStore`] keeps them in a JSON file:
//!
//! ```json
//! {
//!   "default": {
//!     "/redcap/aws/qcchecks/": { "url": "https://redcap.example.org/api/", "token": "..." }
//!   }
//! }
//! ```

mod error;

pub use error::ParameterError;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

/// Parameters stored under one path, keyed by field name.
pub type ParameterMap = HashMap<String, String>;

/// Source of stored parameters.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Returns every parameter stored under `path`.
    async fn get_parameters(&self, path: &str) -> Result<ParameterMap, ParameterError>;
}

/// Parameter store backed by a JSON file, scoped to one profile.
#[derive(Debug, Clone)]
pub struct FileParameterStore {
    path: PathBuf,
    profile: String,
}

impl FileParameterStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, profile: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            profile: profile.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }
}

#[async_trait]
impl ParameterStore for FileParameterStore {
    async fn get_parameters(&self, path: &str) -> Result<ParameterMap, ParameterError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ParameterError::io(&self.path, source))?;
        let mut profiles: HashMap<String, HashMap<String, ParameterMap>> =
            serde_json::from_str(&raw).map_err(|source| ParameterError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let mut entries =
            profiles
                .remove(&self.profile)
                .ok_or_else(|| ParameterError::ProfileNotFound {
                    profile: self.profile.clone(),
                })?;

        // `/a/b/` and `/a/b` name the same parameter path.
        let wanted = path.trim_end_matches('/');
        let stored_key = entries
            .keys()
            .find(|stored| stored.trim_end_matches('/') == wanted)
            .cloned()
            .ok_or_else(|| ParameterError::ParameterNotFound {
                profile: self.profile.clone(),
                path: path.to_string(),
            })?;

        debug!(profile = %self.profile, path = %stored_key, "Loaded stored parameters");
        entries
            .remove(&stored_key)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                profile: self.profile.clone(),
                path: path.to_string(),
            })
    }
}

/// Credentials for a REDCap project API.
#[derive(Clone, PartialEq, Eq)]
pub struct RedcapParameters {
    pub url: String,
    pub token: String,
}

impl RedcapParameters {
    /// Builds project parameters from a stored parameter map.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::MissingField`] if `url` or `token` is absent
    /// or empty.
    pub fn from_map(path: &str, parameters: &ParameterMap) -> Result<Self, ParameterError> {
        Ok(Self {
            url: required_field(path, parameters, "url")?,
            token: required_field(path, parameters, "token")?,
        })
    }
}

// Tokens never reach logs.
impl fmt::Debug for RedcapParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedcapParameters")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Credentials for reading one REDCap report.
#[derive(Clone, PartialEq, Eq)]
pub struct RedcapReportParameters {
    pub url: String,
    pub token: String,
    pub report_id: String,
}

impl RedcapReportParameters {
    /// Builds report parameters from a stored parameter map (`reportid` field).
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::MissingField`] if `url`, `token` or
    /// `reportid` is absent or empty.
    pub fn from_map(path: &str, parameters: &ParameterMap) -> Result<Self, ParameterError> {
        Ok(Self {
            url: required_field(path, parameters, "url")?,
            token: required_field(path, parameters, "token")?,
            report_id: required_field(path, parameters, "reportid")?,
        })
    }

    /// The project-level credentials of this report.
    #[must_use]
    pub fn project(&self) -> RedcapParameters {
        RedcapParameters {
            url: self.url.clone(),
            token: self.token.clone(),
        }
    }
}

impl fmt::Debug for RedcapReportParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedcapReportParameters")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("report_id", &self.report_id)
            .finish()
    }
}

fn required_field(
    path: &str,
    parameters: &ParameterMap,
    field: &'static str,
) -> Result<String, ParameterError> {
    parameters
        .get(field)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ParameterError::MissingField {
            path: path.to_string(),
            field,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PARAMETERS: &str = r#"{
        "default": {
            "/redcap/aws/qcchecks/": { "url": "https://redcap.example.org/api/", "token": "ABC" },
            "/redcap/aws/report": { "url": "https://redcap.example.org/api/", "token": "DEF", "reportid": "42" }
        }
    }"#;

    fn write_parameters(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("parameters.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_file_store_reads_project_parameters() {
        let dir = TempDir::new().unwrap();
        let store = FileParameterStore::new(write_parameters(&dir, PARAMETERS), "default");

        let map = store.get_parameters("/redcap/aws/qcchecks/").await.unwrap();
        let params = RedcapParameters::from_map("/redcap/aws/qcchecks/", &map).unwrap();
        assert_eq!(params.url, "https://redcap.example.org/api/");
        assert_eq!(params.token, "ABC");
    }

    #[tokio::test]
    async fn test_file_store_ignores_trailing_slash_difference() {
        let dir = TempDir::new().unwrap();
        let store = FileParameterStore::new(write_parameters(&dir, PARAMETERS), "default");

        assert!(store.get_parameters("/redcap/aws/qcchecks").await.is_ok());
        let map = store.get_parameters("/redcap/aws/report/").await.unwrap();
        let report = RedcapReportParameters::from_map("/redcap/aws/report/", &map).unwrap();
        assert_eq!(report.report_id, "42");
        assert_eq!(report.project().token, "DEF");
    }

    #[tokio::test]
    async fn test_file_store_unknown_profile() {
        let dir = TempDir::new().unwrap();
        let store = FileParameterStore::new(write_parameters(&dir, PARAMETERS), "prod");
        let err = store.get_parameters("/redcap/aws/qcchecks/").await.unwrap_err();
        assert!(matches!(err, ParameterError::ProfileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_file_store_unknown_path() {
        let dir = TempDir::new().unwrap();
        let store = FileParameterStore::new(write_parameters(&dir, PARAMETERS), "default");
        let err = store.get_parameters("/redcap/aws/other/").await.unwrap_err();
        assert!(matches!(err, ParameterError::ParameterNotFound { .. }));
    }

    #[tokio::test]
    async fn test_file_store_missing_file_suggests_flag() {
        let dir = TempDir::new().unwrap();
        let store = FileParameterStore::new(dir.path().join("absent.json"), "default");
        let err = store.get_parameters("/redcap/aws/qcchecks/").await.unwrap_err();
        assert!(err.to_string().contains("--parameters-file"));
    }

    #[tokio::test]
    async fn test_file_store_invalid_json() {
        let dir = TempDir::new().unwrap();
        let store = FileParameterStore::new(write_parameters(&dir, "{not json"), "default");
        let err = store.get_parameters("/redcap/aws/qcchecks/").await.unwrap_err();
        assert!(matches!(err, ParameterError::Parse { .. }));
    }

    #[test]
    fn test_redcap_parameters_missing_token() {
        let map: ParameterMap = [("url".to_string(), "https://x".to_string())].into();
        let err = RedcapParameters::from_map("/p/", &map).unwrap_err();
        assert!(matches!(err, ParameterError::MissingField { field: "token", .. }));
    }

    #[test]
    fn test_redcap_parameters_debug_redacts_token() {
        let params = RedcapParameters {
            url: "https://x".to_string(),
            token: "SECRET".to_string(),
        };
        let rendered = format!("{params:?}");
        assert!(!rendered.contains("SECRET"));
        assert!(rendered.contains("https://x"));
    }
}
