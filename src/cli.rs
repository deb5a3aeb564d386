//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use redcap_error_checks::config::{ALL_MODULES, DEFAULT_BUCKET, DEFAULT_REDCAP_PROJECT_PATH};

/// Import QC error check definitions into REDCap.
///
/// Reads every error check CSV under `CSV/` in the bucket, validates it
/// against its location and imports the checks into the REDCap project whose
/// credentials are stored under the project path.
#[derive(Parser, Debug)]
#[command(name = "redcap-error-checks-import")]
#[command(author, version, about)]
pub struct Args {
    /// Credential profile to read REDCap parameters from
    #[arg(short, long)]
    pub profile: String,

    /// Bucket holding the error check CSVs [default: nacc-qc-rules]
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Parameter path of the target REDCap project [default: /redcap/aws/qcchecks/]
    #[arg(short = 'r', long)]
    pub redcap_project_path: Option<String>,

    /// Comma-separated modules to import, or "all"
    #[arg(short, long, default_value = ALL_MODULES)]
    pub modules: String,

    /// Stop at the first file that fails validation
    #[arg(long)]
    pub fail_fast: bool,

    /// Validate files without importing anything
    #[arg(long)]
    pub dry_run: bool,

    /// JSON file holding REDCap credentials per profile
    #[arg(long, value_name = "PATH")]
    pub parameters_file: Option<PathBuf>,

    /// S3-compatible endpoint of the bucket [default: https://<bucket>.s3.amazonaws.com]
    #[arg(long, value_name = "URL", conflicts_with = "local_store")]
    pub store_endpoint: Option<String>,

    /// Read error checks from a local directory instead of the bucket
    #[arg(long, value_name = "DIR")]
    pub local_store: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Bucket from the flag, the config file, or the default.
    #[must_use]
    pub fn bucket_or(&self, file_value: Option<&str>) -> String {
        self.bucket
            .as_deref()
            .or(file_value)
            .unwrap_or(DEFAULT_BUCKET)
            .to_string()
    }

    /// Project path from the flag, the config file, or the default.
    #[must_use]
    pub fn redcap_project_path_or(&self, file_value: Option<&str>) -> String {
        self.redcap_project_path
            .as_deref()
            .or(file_value)
            .unwrap_or(DEFAULT_REDCAP_PROJECT_PATH)
            .to_string()
    }

    /// Default log level when `RUST_LOG` is unset.
    ///
    /// Priority: quiet flag > verbose flag > default (info)
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
