//! CLI entry point for the REDCap error check importer.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use redcap_error_checks::config::{
    load_default_file_config, normalize_bucket, normalize_project_path, parse_modules,
    resolve_default_parameters_path,
};
use redcap_error_checks::{
    ErrorChecksImporter, FileParameterStore, HttpObjectStore, ImportOptions, LocalObjectStore,
    ObjectStore, RunOutcome, connect_project,
};
use tracing::{debug, error, info, warn};

mod cli;

use cli::Args;

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(args.default_log_level());

    match run(args).await {
        Ok(exit) => exit.into(),
        Err(err) => {
            error!("{err:#}");
            ProcessExit::Failure.into()
        }
    }
}

// Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

async fn run(args: Args) -> Result<ProcessExit> {
    let loaded = load_default_file_config().context("Failed to load configuration")?;
    if loaded.loaded_from_file
        && let Some(path) = loaded.path.as_deref()
    {
        debug!(path = %path.display(), "Loaded config file");
    }
    let file = loaded.config;

    let bucket = normalize_bucket(&args.bucket_or(file.bucket.as_deref()));
    let project_path =
        normalize_project_path(&args.redcap_project_path_or(file.redcap_project_path.as_deref()));
    let modules = parse_modules(&args.modules);
    let parameters_file = args
        .parameters_file
        .clone()
        .or_else(|| file.parameters_file.clone())
        .or_else(resolve_default_parameters_path)
        .context("No parameters file given and no config directory could be resolved")?;

    info!(
        profile = %args.profile,
        bucket = %bucket,
        redcap_project_path = %project_path,
        modules = ?modules,
        fail_fast = args.fail_fast,
        dry_run = args.dry_run,
        parameters_file = %parameters_file.display(),
        "Starting REDCap error check import"
    );

    let timeouts = file.http_timeouts();
    let store: Box<dyn ObjectStore> = if let Some(dir) = args.local_store.clone() {
        Box::new(LocalObjectStore::new(dir))
    } else {
        let endpoint = args
            .store_endpoint
            .clone()
            .or_else(|| file.store_endpoint.clone())
            .unwrap_or_else(|| HttpObjectStore::default_endpoint(&bucket));
        Box::new(
            HttpObjectStore::with_timeouts(&endpoint, timeouts)
                .context("Failed to set up object store")?,
        )
    };

    let parameters = FileParameterStore::new(parameters_file, args.profile.clone());
    let project = connect_project(&parameters, &project_path, timeouts).await?;

    let options = ImportOptions {
        bucket,
        modules,
        fail_fast: args.fail_fast,
        dry_run: args.dry_run,
    };
    let mut importer = ErrorChecksImporter::new(store, Box::new(project), options);

    match importer.run().await? {
        RunOutcome::Completed { total_records } => {
            debug!(total_records, "Run completed");
        }
        RunOutcome::Aborted { failed_file } => {
            warn!(failed_file = %failed_file, "Run halted early by --fail-fast");
        }
    }
    Ok(ProcessExit::Success)
}

