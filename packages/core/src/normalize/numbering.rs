//! Numbering labels and the per-level numbering alphabets.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{CoreError, Result};
use crate::types::Level;

/// Leading bracketed label, e.g. "(a)" or "(3A)", with trailing whitespace.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LEADING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\(([^()\s]+)\)\s*").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regexes that are guaranteed to be valid
static ALPHABETS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        Regex::new(r"^[a-z]+$").expect("valid regex"),
        Regex::new(r"^[0-9]+[A-Z]*$").expect("valid regex"),
        Regex::new(r"^[A-Z]+$").expect("valid regex"),
        Regex::new(r"^[ivxlcdm]+$").expect("valid regex"),
        Regex::new(r"^[IVXLCDM]+$").expect("valid regex"),
    ]
});

/// Split a leading bracketed label off `text`.
///
/// Returns the label without brackets and the remaining text, or `None`
/// when the text does not start with a label.
///
/// # Examples
/// ```
/// use lexhistory_core::normalize::split_leading_label;
///
/// assert_eq!(split_leading_label("(a) Whoever"), Some(("a", "Whoever")));
/// assert_eq!(split_leading_label("Whoever (a)"), None);
/// ```
pub fn split_leading_label(text: &str) -> Option<(&str, &str)> {
    let captures = LEADING_LABEL.captures(text)?;
    let whole = captures.get(0)?;
    let label = captures.get(1)?;
    Some((label.as_str(), &text[whole.end()..]))
}

/// Strip display decoration from a numbering label: surrounding
/// brackets, whitespace and a trailing period.
///
/// # Examples
/// ```
/// use lexhistory_core::normalize::clean_label;
///
/// assert_eq!(clean_label(" (iv) "), Some("iv".to_string()));
/// assert_eq!(clean_label("2."), Some("2".to_string()));
/// assert_eq!(clean_label("()"), None);
/// ```
pub fn clean_label(label: &str) -> Option<String> {
    let label = label.trim();
    let label = label.strip_suffix('.').unwrap_or(label).trim();
    let label = label
        .strip_prefix('(')
        .and_then(|l| l.strip_suffix(')'))
        .unwrap_or(label)
        .trim();

    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// Whether `token` belongs to the numbering alphabet of `level`.
///
/// Sections carry no numbering token inside a tree, so nothing matches
/// at section level.
#[must_use]
pub fn is_valid_token(level: Level, token: &str) -> bool {
    match level.depth().checked_sub(1) {
        Some(index) => ALPHABETS[index].is_match(token),
        None => false,
    }
}

/// Reject a token outside its level's alphabet.
pub fn validate_token(level: Level, token: &str) -> Result<()> {
    if is_valid_token(level, token) {
        Ok(())
    } else {
        Err(CoreError::InvalidNumbering {
            token: token.to_string(),
            level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_leading_label() {
        assert_eq!(
            split_leading_label("(3A)  The term"),
            Some(("3A", "The term"))
        );
        assert_eq!(split_leading_label("  (i) text"), Some(("i", "text")));
        assert_eq!(split_leading_label("(a)"), Some(("a", "")));
        assert_eq!(split_leading_label("text"), None);
        assert_eq!(split_leading_label("( a) text"), None);
    }

    #[test]
    fn test_clean_label() {
        assert_eq!(clean_label("(a)"), Some("a".to_string()));
        assert_eq!(clean_label("(A)."), Some("A".to_string()));
        assert_eq!(clean_label(" 12 "), Some("12".to_string()));
        assert_eq!(clean_label("  "), None);
    }

    #[test]
    fn test_alphabets() {
        assert!(is_valid_token(Level::Subsection, "a"));
        assert!(is_valid_token(Level::Subsection, "aa"));
        assert!(!is_valid_token(Level::Subsection, "1"));

        assert!(is_valid_token(Level::Paragraph, "12"));
        assert!(is_valid_token(Level::Paragraph, "3A"));
        assert!(!is_valid_token(Level::Paragraph, "a"));

        assert!(is_valid_token(Level::Subparagraph, "B"));
        assert!(!is_valid_token(Level::Subparagraph, "b"));

        assert!(is_valid_token(Level::Clause, "iv"));
        assert!(!is_valid_token(Level::Clause, "a"));

        assert!(is_valid_token(Level::Subclause, "XII"));
        assert!(!is_valid_token(Level::Subclause, "ii"));
    }

    #[test]
    fn test_section_level_rejects_tokens() {
        assert!(!is_valid_token(Level::Section, "922"));
    }

    #[test]
    fn test_validate_token_error() {
        let err = validate_token(Level::Clause, "7").unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidNumbering {
                token: "7".to_string(),
                level: Level::Clause
            }
        );
    }
}
