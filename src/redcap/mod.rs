//! REDCap API transport.
//!
//! - [`RedcapConnection`] - Token-authenticated request plumbing
//! - [`RedcapReportConnection`] - A connection scoped to one report
//! - [`RedcapProject`] - A project and its record import operation
//! - [`RecordImporter`] - The seam the importer submits batches through
//!
//! Failures are never retried here; the caller decides whether they are
//! fatal.

mod connection;
mod error;
mod project;

pub use connection::{RedcapConnection, RedcapReportConnection, RequestForm};
pub use error::RedcapError;
pub use project::{RecordImporter, RedcapProject};
