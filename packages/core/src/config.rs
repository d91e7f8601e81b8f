//! Configuration constants and validation for the core.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::error::{CoreError, Result};

/// Maximum nesting depth of a provision tree (section through subclause).
pub const MAX_DEPTH: usize = 6;

/// Default similarity threshold for aligning siblings across years.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Lowest threshold accepted by [`EngineConfig::validate`].
///
/// Below this, unrelated provisions start pairing up as "modified".
pub const MIN_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Numbering token used for synthetic placeholder nodes.
pub const SYNTHETIC_TOKEN: &str = "_";

/// Environment variable overriding the similarity threshold.
pub const ENV_SIMILARITY_THRESHOLD: &str = "LEXHISTORY_SIMILARITY_THRESHOLD";

/// Environment variable toggling renumbering detection.
pub const ENV_TRACK_RENUMBERING: &str = "LEXHISTORY_TRACK_RENUMBERING";

/// Section identifier: one or more slash-separated path segments.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SECTION_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/?[A-Za-z0-9._-]+(/[A-Za-z0-9._-]+)*$").expect("valid regex")
});

/// Validate a section identifier.
///
/// # Examples
/// ```
/// use lexhistory_core::config::validate_section_id;
///
/// assert!(validate_section_id("/us/usc/t18/s922").is_ok());
/// assert!(validate_section_id("s922").is_ok());
/// assert!(validate_section_id("").is_err());
/// assert!(validate_section_id("/us//s922").is_err());
/// ```
pub fn validate_section_id(section_id: &str) -> Result<()> {
    if SECTION_ID_PATTERN.is_match(section_id) {
        Ok(())
    } else {
        Err(CoreError::InvalidSectionId(section_id.to_string()))
    }
}

/// Validate a chronology of years: non-empty and strictly increasing.
///
/// # Examples
/// ```
/// use lexhistory_core::config::validate_years;
///
/// assert!(validate_years(&[2010, 2015, 2020]).is_ok());
/// assert!(validate_years(&[2015, 2010]).is_err());
/// assert!(validate_years(&[]).is_err());
/// ```
pub fn validate_years(years: &[i32]) -> Result<()> {
    if years.is_empty() {
        return Err(CoreError::InvalidTimeline("no years requested".to_string()));
    }
    if let Some(pair) = years.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(CoreError::InvalidTimeline(format!(
            "years must be strictly increasing, got {} before {}",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

/// Tunables for the diff engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Minimum similarity for two siblings to count as the same provision.
    pub similarity_threshold: f64,

    /// Set `renumbered` on matched pairs whose numbering token changed.
    pub track_renumbering: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            track_renumbering: true,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_track_renumbering(mut self, track: bool) -> Self {
        self.track_renumbering = track;
        self
    }

    /// Read overrides from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_SIMILARITY_THRESHOLD) {
            config.similarity_threshold = raw.trim().parse().map_err(|_| {
                CoreError::InvalidConfig(format!("{ENV_SIMILARITY_THRESHOLD}={raw} is not a number"))
            })?;
        }

        if let Ok(raw) = std::env::var(ENV_TRACK_RENUMBERING) {
            config.track_renumbering = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(CoreError::InvalidConfig(format!(
                        "{ENV_TRACK_RENUMBERING}={raw} is not a boolean"
                    )))
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document; missing keys take their defaults.
    ///
    /// # Examples
    /// ```
    /// use lexhistory_core::config::EngineConfig;
    ///
    /// let config = EngineConfig::from_yaml_str("similarity_threshold: 0.75").unwrap();
    /// assert_eq!(config.similarity_threshold, 0.75);
    /// assert!(config.track_renumbering);
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the threshold lies in `[MIN_SIMILARITY_THRESHOLD, 1]`.
    pub fn validate(&self) -> Result<()> {
        let t = self.similarity_threshold;
        if !t.is_finite() || !(MIN_SIMILARITY_THRESHOLD..=1.0).contains(&t) {
            return Err(CoreError::InvalidConfig(format!(
                "similarity_threshold must be between {MIN_SIMILARITY_THRESHOLD} and 1, got {t}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_section_id() {
        assert!(validate_section_id("/us/usc/t18/s922").is_ok());
        assert!(validate_section_id("t26/s1").is_ok());
        assert!(validate_section_id("/").is_err());
        assert!(validate_section_id("s922/").is_err());
        assert!(validate_section_id("s 922").is_err());
    }

    #[test]
    fn test_validate_years() {
        assert!(validate_years(&[2020]).is_ok());
        assert!(validate_years(&[2010, 2010]).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(EngineConfig::new().with_similarity_threshold(0.59).validate().is_err());
        assert!(EngineConfig::new().with_similarity_threshold(1.0).validate().is_ok());
        assert!(EngineConfig::new().with_similarity_threshold(1.2).validate().is_err());
        assert!(EngineConfig::new()
            .with_similarity_threshold(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_yaml_str() {
        let config =
            EngineConfig::from_yaml_str("similarity_threshold: 0.8\ntrack_renumbering: false\n")
                .unwrap();
        assert_eq!(config.similarity_threshold, 0.8);
        assert!(!config.track_renumbering);
    }

    #[test]
    fn test_from_yaml_str_rejects_unknown_keys() {
        assert!(EngineConfig::from_yaml_str("threshold: 0.8").is_err());
    }

    #[test]
    fn test_from_yaml_str_rejects_low_threshold() {
        let err = EngineConfig::from_yaml_str("similarity_threshold: 0.3").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }
}
