//! Runtime configuration: the optional config file and normalisation of
//! command-line inputs.
//!
//! The config file lives at `$XDG_CONFIG_HOME/redcap-error-checks/config.toml`
//! (or `$HOME/.config/redcap-error-checks/config.toml`) and holds simple
//! `key = value` lines:
//!
//! ```toml
//! bucket = "nacc-qc-rules"
//! redcap_project_path = "/redcap/aws/qcchecks/"
//! read_timeout_secs = 600 # large imports
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::http::HttpTimeouts;

/// Directory name used below the user's config directory.
pub const CONFIG_DIR_NAME: &str = "redcap-error-checks";

/// Bucket read when none is given.
pub const DEFAULT_BUCKET: &str = "nacc-qc-rules";

/// Parameter path of the QC checks project when none is given.
pub const DEFAULT_REDCAP_PROJECT_PATH: &str = "/redcap/aws/qcchecks/";

/// Module filter value that selects every module.
pub const ALL_MODULES: &str = "all";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// The config file path
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A line is not of the form `key = value`
    #[error("Invalid config syntax on line {line}: expected key = value")]
    Syntax {
        /// 1-based line number
        line: usize,
    },

    /// A key is not recognised
    #[error("Unknown configuration key: '{key}' on line {line}")]
    UnknownKey {
        /// The unrecognised key
        key: String,
        /// 1-based line number
        line: usize,
    },

    /// A value has the wrong shape
    #[error("Invalid `{key}` value on line {line}: {reason}")]
    InvalidValue {
        /// The key being set
        key: &'static str,
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A value is outside its allowed range
    #[error("Invalid config value for `{key}`: {value}. Expected range: {range}")]
    OutOfRange {
        /// The key being set
        key: &'static str,
        /// The rejected value
        value: u64,
        /// The allowed range
        range: &'static str,
    },
}

/// Values read from the config file. Unset keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Bucket holding the error check CSVs.
    pub bucket: Option<String>,
    /// Parameter path of the target REDCap project.
    pub redcap_project_path: Option<String>,
    /// JSON file holding REDCap credentials per profile.
    pub parameters_file: Option<PathBuf>,
    /// S3-compatible endpoint for the bucket.
    pub store_endpoint: Option<String>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates values against their allowed ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for a timeout outside `1..=3600`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)
    }

    /// HTTP timeouts with file values applied over the defaults.
    #[must_use]
    pub fn http_timeouts(&self) -> HttpTimeouts {
        let defaults = HttpTimeouts::default();
        HttpTimeouts {
            connect_timeout_secs: self
                .connect_timeout_secs
                .unwrap_or(defaults.connect_timeout_secs),
            read_timeout_secs: self.read_timeout_secs.unwrap_or(defaults.read_timeout_secs),
        }
    }
}

fn validate_timeout_secs(key: &'static str, value: Option<u64>) -> Result<(), ConfigError> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::OutOfRange {
            key,
            value,
            range: "1..=3600",
        });
    }
    Ok(())
}

/// Outcome of looking for the default config file.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed config, or the empty default when no file exists.
    pub config: FileConfig,
    /// Whether a file was found and read.
    pub loaded_from_file: bool,
}

/// Resolves the directory holding this tool's config files.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/redcap-error-checks`
/// 2. `$HOME/.config/redcap-error-checks`
#[must_use]
pub fn resolve_config_dir() -> Option<PathBuf> {
    config_dir_from(env_var_non_empty_os("XDG_CONFIG_HOME"), env_var_non_empty_os("HOME"))
}

fn config_dir_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(PathBuf::from(xdg_config_home).join(CONFIG_DIR_NAME));
    }
    let home = home?;
    Some(PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME))
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Default config file path.
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    resolve_config_dir().map(|dir| dir.join("config.toml"))
}

/// Default credentials file path.
#[must_use]
pub fn resolve_default_parameters_path() -> Option<PathBuf> {
    resolve_config_dir().map(|dir| dir.join("parameters.json"))
}

/// Loads the config file from the default path if present.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but cannot be read or parsed.
pub fn load_default_file_config() -> Result<LoadedConfig, ConfigError> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref().filter(|path| path.exists()) else {
        return Ok(LoadedConfig {
            path,
            config: FileConfig::default(),
            loaded_from_file: false,
        });
    };

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config,
        loaded_from_file: true,
    })
}

/// Reads and parses one config file.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read or parsed.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&raw)
}

/// Parses `key = value` config text.
///
/// # Errors
///
/// Returns [`ConfigError`] for bad syntax, unknown keys or invalid values.
pub fn parse_config_str(raw: &str) -> Result<FileConfig, ConfigError> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_num = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            return Err(ConfigError::Syntax { line: line_num });
        };
        let value = raw_value.trim();

        match raw_key.trim() {
            "bucket" => {
                cfg.bucket = Some(parse_string_literal("bucket", value, line_num)?);
            }
            "redcap_project_path" => {
                cfg.redcap_project_path =
                    Some(parse_string_literal("redcap_project_path", value, line_num)?);
            }
            "parameters_file" => {
                let parsed = parse_string_literal("parameters_file", value, line_num)?;
                cfg.parameters_file = Some(PathBuf::from(parsed));
            }
            "store_endpoint" => {
                cfg.store_endpoint = Some(parse_string_literal("store_endpoint", value, line_num)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs =
                    Some(parse_integer_u64("connect_timeout_secs", value, line_num)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs =
                    Some(parse_integer_u64("read_timeout_secs", value, line_num)?);
            }
            unknown => {
                return Err(ConfigError::UnknownKey {
                    key: unknown.to_string(),
                    line: line_num,
                });
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(key: &'static str, raw_value: &str, line: usize) -> Result<String, ConfigError> {
    raw_value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map(str::to_string)
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            line,
            reason: "expected double-quoted string".to_string(),
        })
}

fn parse_integer_u64(key: &'static str, raw_value: &str, line: usize) -> Result<u64, ConfigError> {
    raw_value
        .trim()
        .parse::<u64>()
        .map_err(|error| ConfigError::InvalidValue {
            key,
            line,
            reason: error.to_string(),
        })
}

/// Strips an `s3://` scheme and trailing `/` from a bucket name.
#[must_use]
pub fn normalize_bucket(bucket: &str) -> String {
    let bucket = bucket.trim();
    bucket
        .strip_prefix("s3://")
        .unwrap_or(bucket)
        .trim_end_matches('/')
        .to_string()
}

/// Ensures a parameter path ends with `/`.
#[must_use]
pub fn normalize_project_path(path: &str) -> String {
    let path = path.trim();
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Splits a comma-separated module list, dropping empty entries.
///
/// An empty list selects every module.
#[must_use]
pub fn parse_modules(raw: &str) -> Vec<String> {
    let modules: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|module| !module.is_empty())
        .map(str::to_string)
        .collect();
    if modules.is_empty() {
        vec![ALL_MODULES.to_string()]
    } else {
        modules
    }
}
