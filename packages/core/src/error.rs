//! Error types for the provision history core.
//!
//! Only contract violations and not-found conditions become error values.
//! Recoverable structural problems (unknown style keys, level gaps, orphan
//! continuations) are recorded as node flags and processing continues.

use thiserror::Error;

use crate::types::Level;

/// Broad classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller passed input that breaks a contract; no partial result.
    ContractViolation,
    /// A requested extract or section does not exist.
    NotFound,
}

/// Main error type for the core library.
///
/// Errors are `Clone` so that every caller coalesced onto one in-flight
/// tree build can receive the builder's error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Diff requested across two different sections.
    #[error("Cannot diff section '{from}' against section '{to}'")]
    SectionMismatch { from: String, to: String },

    /// Numbering token outside the alphabet of its level.
    #[error("Numbering token '{token}' is not valid at {level} level")]
    InvalidNumbering { token: String, level: Level },

    /// Raw markup is not well-formed XML.
    #[error("XML parsing failed: {0}")]
    XmlParse(String),

    /// Missing required XML element.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// Malformed section identifier.
    #[error("Invalid section identifier: '{0}'")]
    InvalidSectionId(String),

    /// No raw extract is available for the requested year.
    #[error("No extract for section '{section_id}' in year {year}")]
    ExtractNotFound { section_id: String, year: i32 },

    /// The extract exists but does not contain the requested section.
    #[error("Section '{section_id}' not found in extract")]
    SectionNotFound { section_id: String },

    /// Change sets handed to the aggregator do not form one chronology.
    #[error("Invalid timeline input: {0}")]
    InvalidTimeline(String),

    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// Classify this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ExtractNotFound { .. } | Self::SectionNotFound { .. } => ErrorClass::NotFound,
            _ => ErrorClass::ContractViolation,
        }
    }
}

impl From<roxmltree::Error> for CoreError {
    fn from(err: roxmltree::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<serde_yaml_ng::Error> for CoreError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidNumbering {
            token: "7".to_string(),
            level: Level::Subsection,
        };
        assert_eq!(
            err.to_string(),
            "Numbering token '7' is not valid at subsection level"
        );
    }

    #[test]
    fn test_not_found_is_distinct() {
        let missing_year = CoreError::ExtractNotFound {
            section_id: "/us/usc/t18/s922".to_string(),
            year: 2012,
        };
        let missing_section = CoreError::SectionNotFound {
            section_id: "/us/usc/t18/s922".to_string(),
        };
        assert_eq!(missing_year.class(), ErrorClass::NotFound);
        assert_eq!(missing_section.class(), ErrorClass::NotFound);
        assert_ne!(missing_year, missing_section);
        assert!(missing_year.to_string().contains("2012"));
    }

    #[test]
    fn test_contract_violation_class() {
        let err = CoreError::SectionMismatch {
            from: "a".to_string(),
            to: "b".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::ContractViolation);
    }

    #[test]
    fn test_xml_error_conversion() {
        let err: CoreError = match roxmltree::Document::parse("<open>") {
            Err(e) => e.into(),
            Ok(_) => unreachable!("unterminated element must fail"),
        };
        assert!(matches!(err, CoreError::XmlParse(_)));
    }
}
