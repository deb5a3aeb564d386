//! Object store access for error check CSVs.
//!
//! Keys are `/`-delimited strings such as
//! `CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv`.
//!
//! - [`HttpObjectStore`] - S3-compatible bucket over HTTP(S)
//! - [`LocalObjectStore`] - A directory tree standing in for a bucket

mod error;
mod local;
mod s3;

pub use error::StoreError;
pub use local::LocalObjectStore;
pub use s3::HttpObjectStore;

use async_trait::async_trait;

/// Prefix every error check CSV lives under.
pub const CSV_PREFIX: &str = "CSV";

/// Suffix identifying CSV objects.
pub const CSV_SUFFIX: &str = ".csv";

/// Read access to a bucket of objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns every key starting with `prefix`, across all listing pages.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Returns the content of the object stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Human-readable location of the store, used in logs.
    fn location(&self) -> String;
}
