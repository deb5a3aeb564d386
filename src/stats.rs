//! Run-level accounting for an error check import.

use std::collections::BTreeSet;

/// Accumulates counters and error codes across every file of one run.
///
/// One instance lives for the whole run and is passed by reference to every
/// step that needs it.
#[derive(Debug, Default, Clone)]
pub struct ImportStats {
    total_records: usize,
    all_error_codes: BTreeSet<String>,
    failed_files: Vec<String>,
}

impl ImportStats {
    /// Creates a tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records the remote project reported as imported.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.total_records
    }

    /// Every error code seen so far in this run.
    #[must_use]
    pub fn all_error_codes(&self) -> &BTreeSet<String> {
        &self.all_error_codes
    }

    /// Files that failed validation, in the order they failed.
    #[must_use]
    pub fn failed_files(&self) -> &[String] {
        &self.failed_files
    }

    pub fn add_to_total_records(&mut self, num_records: usize) {
        self.total_records += num_records;
    }

    pub fn add_failed_file(&mut self, failed_file: impl Into<String>) {
        self.failed_files.push(failed_file.into());
    }

    /// Adds error codes and returns the ones already seen.
    ///
    /// A code counts as a duplicate if an earlier call, or an earlier entry of
    /// this call, already added it. Every code is tracked regardless; the
    /// caller decides what to do with the duplicates.
    pub fn add_error_codes<I, S>(&mut self, error_codes: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut duplicates = Vec::new();
        for code in error_codes {
            let code = code.into();
            if !self.all_error_codes.insert(code.clone()) {
                duplicates.push(code);
            }
        }
        duplicates
    }
}
