//! Error check CSV ingestion and validation.
//!
//! This module turns the raw content of one error check CSV into validated,
//! upload-ready records:
//!
//! - [`read_csv`] - Streams header and rows into a [`CsvVisitor`]
//! - [`ErrorCheckCsvVisitor`] - Validates rows against the file's [`ErrorCheckKey`](crate::key::ErrorCheckKey)
//! - [`ErrorCheckRecord`] - The projected record imported into REDCap
//!
//! # Example
//!
//! ```
//! use redcap_error_checks::ingest::{DEFAULT_DELIMITER, ErrorCheckCsvVisitor, read_csv};
//! use redcap_error_checks::key::ErrorCheckKey;
//!
//! let key = ErrorCheckKey::parse("CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv").unwrap();
//! let mut visitor = ErrorCheckCsvVisitor::new(key);
//! let data = "error_code,error_type,form_name,packet,var_name,check_type,test_name,\
//!             short_desc,full_desc,test_logic,comp_forms,comp_vars\n\
//!             a1-ivp-m-001,Error,a1,I,VAR,Missingness,VAR present,short,full,logic,,\n";
//!
//! assert!(read_csv(data.as_bytes(), &mut visitor, DEFAULT_DELIMITER));
//! assert_eq!(visitor.validated_error_checks().len(), 1);
//! ```

mod reader;
mod record;
mod visitor;

pub use reader::{DEFAULT_DELIMITER, read_csv};
pub use record::{
    ALLOWED_EMPTY_FIELDS, CsvRow, ErrorCheckRecord, PACKET_FIELD, REQUIRED_HEADERS,
    is_required_header,
};
pub use visitor::{CsvVisitor, ErrorCheckCsvVisitor, ValidationIssue};
