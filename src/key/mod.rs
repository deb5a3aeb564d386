//! Storage key parsing for error check CSV files.
//!
//! Error check files live under a fixed `CSV` namespace and encode the form
//! they belong to in their path:
//!
//! ```text
//! CSV / MODULE / FORM_VER / PACKET / form_<FORM_NAME>_<PACKET>_error_checks_<type>.csv
//! CSV / ENROLL / FORM_VER / <enrollment filename>.csv
//! ```
//!
//! The enrollment module is the only one stored without a packet directory.
//!
//! # Example
//!
//! ```
//! use redcap_error_checks::key::ErrorCheckKey;
//!
//! let key = ErrorCheckKey::parse("CSV/UDS/4.0/F/form_header_fvp_error_checks_mc.csv").unwrap();
//! assert_eq!(key.form_name(), "uds_header");
//! assert_eq!(key.visit_type(), Some("fvp"));
//! ```

mod error;

pub use error::KeyError;

use std::fmt;

/// Top-level namespace every error check key starts with.
pub const CSV_NAMESPACE: &str = "CSV";

/// Module stored without a packet directory.
pub const ENROLLMENT_MODULE: &str = "ENROLL";

/// Form name used for every enrollment error check.
pub const ENROLLMENT_FORM_NAME: &str = "enrl";

/// Filename token marking a module-level header form.
pub const HEADER_FORM_TOKEN: &str = "header";

/// Identity of an error check file, derived from its storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCheckKey {
    full_path: String,
    namespace: String,
    module: String,
    form_ver: String,
    filename: String,
    form_name: String,
    packet: Option<String>,
}

impl ErrorCheckKey {
    /// Parses a `/`-delimited storage key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MissingNamespace`] if the key is not under `CSV`,
    /// [`KeyError::Malformed`] if it has neither 4 nor 5 segments (or the
    /// filename carries no form token), and [`KeyError::UnexpectedModule`]
    /// for a 4-segment key outside the enrollment module.
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let parts: Vec<&str> = key.split('/').collect();

        if parts[0] != CSV_NAMESPACE {
            return Err(KeyError::MissingNamespace {
                key: key.to_string(),
            });
        }

        match parts.as_slice() {
            [namespace, module, form_ver, packet, filename] => {
                let form_name = derive_form_name(module, filename).ok_or_else(|| {
                    KeyError::Malformed {
                        key: key.to_string(),
                    }
                })?;

                Ok(Self {
                    full_path: key.to_string(),
                    namespace: (*namespace).to_string(),
                    module: (*module).to_string(),
                    form_ver: (*form_ver).to_string(),
                    filename: (*filename).to_string(),
                    form_name,
                    packet: Some((*packet).to_string()),
                })
            }
            [namespace, module, form_ver, filename] => {
                if *module != ENROLLMENT_MODULE {
                    return Err(KeyError::UnexpectedModule {
                        key: key.to_string(),
                        module: (*module).to_string(),
                    });
                }

                Ok(Self {
                    full_path: key.to_string(),
                    namespace: (*namespace).to_string(),
                    module: (*module).to_string(),
                    form_ver: (*form_ver).to_string(),
                    filename: (*filename).to_string(),
                    form_name: ENROLLMENT_FORM_NAME.to_string(),
                    packet: None,
                })
            }
            _ => Err(KeyError::Malformed {
                key: key.to_string(),
            }),
        }
    }

    /// The original storage key.
    #[must_use]
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// The namespace marker (always `CSV`).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn form_ver(&self) -> &str {
        &self.form_ver
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Form name every row of this file must declare.
    #[must_use]
    pub fn form_name(&self) -> &str {
        &self.form_name
    }

    /// Packet code; `None` only for enrollment keys.
    #[must_use]
    pub fn packet(&self) -> Option<&str> {
        self.packet.as_deref()
    }

    /// Visit type implied by the packet.
    ///
    /// `I4` maps to `i4vp`, any packet starting with `F` to `fvp`, every
    /// other packet to `ivp`. Keys without a packet have no visit type.
    #[must_use]
    pub fn visit_type(&self) -> Option<&'static str> {
        let packet = self.packet.as_deref().filter(|packet| !packet.is_empty())?;

        if packet == "I4" {
            return Some("i4vp");
        }

        if packet.starts_with('F') {
            Some("fvp")
        } else {
            Some("ivp")
        }
    }
}

impl fmt::Display for ErrorCheckKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

/// Form name is the second `_` token of the filename; a `header` token is
/// qualified with the lowercased module.
fn derive_form_name(module: &str, filename: &str) -> Option<String> {
    let token = filename.split('_').nth(1)?;
    if token == HEADER_FORM_TOKEN {
        Some(format!("{}_{HEADER_FORM_TOKEN}", module.to_lowercase()))
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_packet_key_uses_literal_segments() {
        let key = ErrorCheckKey::parse("CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv").unwrap();
        assert_eq!(key.full_path(), "CSV/UDS/4.0/I/form_a1_ivp_error_checks_mc.csv");
        assert_eq!(key.namespace(), "CSV");
        assert_eq!(key.module(), "UDS");
        assert_eq!(key.form_ver(), "4.0");
        assert_eq!(key.packet(), Some("I"));
        assert_eq!(key.filename(), "form_a1_ivp_error_checks_mc.csv");
        assert_eq!(key.form_name(), "a1");
    }

    #[test]
    fn test_parse_header_form_prefixes_lowercased_module() {
        let key = ErrorCheckKey::parse("CSV/UDS/4.0/F/form_header_fvp_error_checks_mc.csv").unwrap();
        assert_eq!(key.form_name(), "uds_header");
        assert_eq!(key.packet(), Some("F"));
    }

    #[test]
    fn test_parse_enrollment_key_has_no_packet() {
        let key = ErrorCheckKey::parse("CSV/ENROLL/1.0/form_dummy_error_checks.csv").unwrap();
        assert_eq!(key.module(), "ENROLL");
        assert_eq!(key.form_ver(), "1.0");
        assert_eq!(key.packet(), None);
        assert_eq!(key.filename(), "form_dummy_error_checks.csv");
        assert_eq!(key.form_name(), ENROLLMENT_FORM_NAME);
        assert_eq!(key.visit_type(), None);
    }

    #[test]
    fn test_parse_rejects_missing_namespace() {
        let err = ErrorCheckKey::parse("JSON/UDS/4.0/I/form_a1_ivp.csv").unwrap_err();
        assert!(matches!(err, KeyError::MissingNamespace { .. }));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_parse_rejects_wrong_segment_counts() {
        for key in [
            "CSV",
            "CSV/bad",
            "CSV/bad/key.csv",
            "CSV/UDS/4.0/I/extra/form_a1_ivp.csv",
        ] {
            let err = ErrorCheckKey::parse(key).unwrap_err();
            assert_eq!(
                err,
                KeyError::Malformed {
                    key: key.to_string()
                },
                "{key} should be malformed"
            );
        }
    }

    #[test]
    fn test_parse_rejects_filename_without_form_token() {
        let err = ErrorCheckKey::parse("CSV/UDS/4.0/I/errorchecks.csv").unwrap_err();
        assert!(matches!(err, KeyError::Malformed { .. }));
    }

    #[test]
    fn test_parse_packetless_key_outside_enrollment_is_layout_fault() {
        let err = ErrorCheckKey::parse("CSV/UDS/4.0/form_a1_error_checks.csv").unwrap_err();
        assert_eq!(
            err,
            KeyError::UnexpectedModule {
                key: "CSV/UDS/4.0/form_a1_error_checks.csv".to_string(),
                module: "UDS".to_string(),
            }
        );
    }

    #[test]
    fn test_visit_type_mapping() {
        let cases = [
            ("I4", "i4vp"),
            ("F", "fvp"),
            ("FL", "fvp"),
            ("I", "ivp"),
            ("T", "ivp"),
            ("dummy_packet", "ivp"),
        ];
        for (packet, expected) in cases {
            let key =
                ErrorCheckKey::parse(&format!("CSV/UDS/4.0/{packet}/form_a1_error_checks.csv"))
                    .unwrap();
            assert_eq!(key.visit_type(), Some(expected), "packet {packet}");
        }
    }

    #[test]
    fn test_display_is_full_path() {
        let key = ErrorCheckKey::parse("CSV/ENROLL/1.0/form_dummy_error_checks.csv").unwrap();
        assert_eq!(key.to_string(), "CSV/ENROLL/1.0/form_dummy_error_checks.csv");
    }
}
