//! Loading the target REDCap project from stored credentials.

use tracing::info;

use super::error::ImportError;
use crate::http::HttpTimeouts;
use crate::params::{ParameterStore, RedcapParameters};
use crate::redcap::{RedcapConnection, RedcapProject};

/// Reads the credentials stored under `project_path` and connects to the
/// project they point at.
///
/// # Errors
///
/// Returns [`ImportError::Setup`] if the credentials cannot be loaded or the
/// project does not answer.
pub async fn connect_project(
    parameters: &dyn ParameterStore,
    project_path: &str,
    timeouts: HttpTimeouts,
) -> Result<RedcapProject, ImportError> {
    let stored = parameters
        .get_parameters(project_path)
        .await
        .map_err(|error| ImportError::setup(project_path, error))?;
    let credentials = RedcapParameters::from_map(project_path, &stored)
        .map_err(|error| ImportError::setup(project_path, error))?;

    let connection = RedcapConnection::with_timeouts(&credentials, timeouts)
        .map_err(|error| ImportError::setup(project_path, error))?;
    let project = RedcapProject::create(connection)
        .await
        .map_err(|error| ImportError::setup(project_path, error))?;

    info!(
        path = project_path,
        pid = project.pid(),
        title = project.title(),
        "Loaded REDCap project"
    );
    Ok(project)
}
