//! Import orchestration.
//!
//! [`ErrorChecksImporter`] walks every error check CSV in the bucket, one
//! file at a time:
//!
//! 1. list keys under `CSV` and keep the `.csv` ones
//! 2. parse the key and apply the module filter
//! 3. fetch and validate the file against its key
//! 4. reject the whole file if any error code was already seen
//! 5. import the batch into REDCap (skipped on a dry run)
//!
//! A file failing steps 2-4 is recorded and the run moves on, unless
//! fail-fast is set. Transport failures end the run immediately.

mod error;
mod setup;

pub use error::ImportError;
pub use setup::connect_project;

use tracing::{debug, error, info, instrument, warn};

use crate::config::ALL_MODULES;
use crate::ingest::{DEFAULT_DELIMITER, ErrorCheckCsvVisitor, ErrorCheckRecord, read_csv};
use crate::key::ErrorCheckKey;
use crate::redcap::RecordImporter;
use crate::stats::ImportStats;
use crate::store::{CSV_PREFIX, CSV_SUFFIX, ObjectStore};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Settings of one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Bucket name, used to render file locations in logs.
    pub bucket: String,
    /// Modules to import; `["all"]` selects every module.
    pub modules: Vec<String>,
    /// Halt at the first file that fails.
    pub fail_fast: bool,
    /// Validate everything but skip the REDCap import.
    pub dry_run: bool,
}

impl ImportOptions {
    /// Options importing every module of `bucket`.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            modules: vec![ALL_MODULES.to_string()],
            fail_fast: false,
            dry_run: false,
        }
    }

    /// Whether files of `module` are part of this run.
    #[must_use]
    pub fn includes_module(&self, module: &str) -> bool {
        self.modules.iter().any(|m| m == ALL_MODULES) || self.modules.iter().any(|m| m == module)
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every selected file was imported (or validated, on a dry run).
    Completed { total_records: usize },
    /// Fail-fast stopped the run at this file.
    Aborted { failed_file: String },
}

/// Imports error check CSVs from an object store into REDCap.
pub struct ErrorChecksImporter {
    store: Box<dyn ObjectStore>,
    importer: Box<dyn RecordImporter>,
    options: ImportOptions,
    stats: ImportStats,
}

impl std::fmt::Debug for ErrorChecksImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorChecksImporter")
            .field("store", &self.store.location())
            .field("options", &self.options)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl ErrorChecksImporter {
    #[must_use]
    pub fn new(
        store: Box<dyn ObjectStore>,
        importer: Box<dyn RecordImporter>,
        options: ImportOptions,
    ) -> Self {
        Self {
            store,
            importer,
            options,
            stats: ImportStats::new(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> &ImportStats {
        &self.stats
    }

    #[must_use]
    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Renders the `s3://bucket/key` location of a file.
    #[must_use]
    pub fn build_full_path(&self, key: &ErrorCheckKey) -> String {
        format!("s3://{}/{}", self.options.bucket, key.full_path())
    }

    /// Validates one file and checks its error codes against `stats`.
    ///
    /// Returns the batch to import, or `None` when the file is invalid, holds
    /// no error checks, or repeats an error code seen earlier. Codes of a
    /// valid file are tracked in `stats` even when the batch is rejected.
    pub fn load_error_check_csv(
        key: &ErrorCheckKey,
        content: &[u8],
        stats: &mut ImportStats,
    ) -> Option<Vec<ErrorCheckRecord>> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
        let text = match std::str::from_utf8(content) {
            Ok(text) => text,
            Err(err) => {
                error!(key = %key, "File is not valid UTF-8: {err}");
                return None;
            }
        };

        let mut visitor = ErrorCheckCsvVisitor::new(key.clone());
        if !read_csv(text.as_bytes(), &mut visitor, DEFAULT_DELIMITER) {
            error!(
                key = %key,
                issues = visitor.issues().len(),
                "Errors encountered while reading from {}",
                key.full_path()
            );
            return None;
        }

        let error_checks = visitor.into_validated_error_checks();
        if error_checks.is_empty() {
            error!("No error checks found in {}; invalid file?", key.full_path());
            return None;
        }

        let duplicates =
            stats.add_error_codes(error_checks.iter().map(|check| check.error_code.clone()));
        if !duplicates.is_empty() {
            error!("Found duplicated errors, will not import file: {duplicates:?}");
            return None;
        }

        Some(error_checks)
    }

    /// Imports one validated batch, adding the accepted count to the stats.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Transport`] if REDCap fails the import.
    #[instrument(level = "debug", skip(self, error_checks), fields(records = error_checks.len()))]
    pub async fn import_to_redcap(
        &mut self,
        full_path: &str,
        error_checks: &[ErrorCheckRecord],
    ) -> Result<usize, ImportError> {
        if self.options.dry_run {
            info!(
                "DRY RUN: Skipping import of {} records from {full_path}",
                error_checks.len()
            );
            return Ok(0);
        }

        let batch = serde_json::to_string(error_checks)?;
        let num_records = self.importer.import_records(&batch).await?;
        info!("Imported {num_records} records from {full_path}");
        self.stats.add_to_total_records(num_records);
        Ok(num_records)
    }

    /// Runs the import over every selected file.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Store`] or [`ImportError::Transport`] as soon as
    /// a collaborator fails, and [`ImportError::FailedFiles`] at the end when
    /// any file failed without fail-fast set.
    pub async fn run(&mut self) -> Result<RunOutcome, ImportError> {
        info!(store = %self.store.location(), "Running REDCap error check import");

        let keys: Vec<String> = self
            .store
            .list(CSV_PREFIX)
            .await?
            .into_iter()
            .filter(|key| key.ends_with(CSV_SUFFIX))
            .collect();
        if keys.is_empty() {
            error!("No files found in {}/{CSV_PREFIX}", self.options.bucket);
        }

        for raw_key in keys {
            let key = match ErrorCheckKey::parse(&raw_key) {
                Ok(key) => key,
                Err(err) => {
                    error!(key = %raw_key, "{err}");
                    if let Some(outcome) = self.record_failed_file(raw_key) {
                        return Ok(outcome);
                    }
                    continue;
                }
            };

            if !self.options.includes_module(key.module()) {
                debug!(key = %key, module = key.module(), "Skipping module not selected");
                continue;
            }

            let full_path = self.build_full_path(&key);
            info!("Loading error checks from {full_path}");
            let content = self.store.get(&raw_key).await?;

            let Some(error_checks) = Self::load_error_check_csv(&key, &content, &mut self.stats)
            else {
                if let Some(outcome) = self.record_failed_file(raw_key) {
                    return Ok(outcome);
                }
                continue;
            };

            self.import_to_redcap(&full_path, &error_checks).await?;
        }

        if !self.stats.failed_files().is_empty() {
            return Err(ImportError::FailedFiles {
                files: self.stats.failed_files().to_vec(),
            });
        }

        if self.stats.all_error_codes().is_empty() {
            warn!("No error codes were found; check the module filter {:?}", self.options.modules);
        }
        info!(
            "Import complete! Imported {} total records",
            self.stats.total_records()
        );
        Ok(RunOutcome::Completed {
            total_records: self.stats.total_records(),
        })
    }

    fn record_failed_file(&mut self, failed_file: String) -> Option<RunOutcome> {
        self.stats.add_failed_file(failed_file.clone());
        if self.options.fail_fast {
            error!("fail_fast set, halting execution at {failed_file}");
            return Some(RunOutcome::Aborted { failed_file });
        }
        info!("Errors encountered, continuing to next file");
        None
    }
}
