//! REDCap error check import library.
//!
//! Error checks are QC rule definitions kept as CSV files in an object
//! store, one file per form and packet. This library validates those files
//! against their storage keys and imports them as records into a REDCap
//! project.
//!
//! # Architecture
//!
//! - [`key`] - Parsing storage keys into module, form version, packet and form name
//! - [`ingest`] - CSV reading and row validation
//! - [`stats`] - Run-wide totals, error codes and failed files
//! - [`store`] - Object store access (S3-compatible HTTP or a local directory)
//! - [`params`] - Stored REDCap credentials
//! - [`redcap`] - REDCap API transport
//! - [`importer`] - The per-file import run
//! - [`config`] - Config file and CLI input normalisation
//! - [`http`] - Shared HTTP client policy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod http;
pub mod importer;
pub mod ingest;
pub mod key;
pub mod params;
pub mod redcap;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use importer::{ErrorChecksImporter, ImportError, ImportOptions, RunOutcome, connect_project};
pub use ingest::{CsvVisitor, ErrorCheckCsvVisitor, ErrorCheckRecord, read_csv};
pub use key::{ErrorCheckKey, KeyError};
pub use params::{FileParameterStore, ParameterError, ParameterStore, RedcapParameters};
pub use redcap::{RecordImporter, RedcapConnection, RedcapError, RedcapProject};
pub use stats::ImportStats;
pub use store::{HttpObjectStore, LocalObjectStore, ObjectStore, StoreError};
