//! Normalized text similarity used for sibling alignment and magnitude.
//!
//! Similarity is one minus the token-level edit distance divided by the
//! longer token count. It is 1 exactly when both texts have the same
//! whitespace-separated token sequence.

use crate::text::tokens;

/// Similarity of two texts in `[0, 1]`. Two empty texts are identical.
///
/// # Examples
/// ```
/// use lexhistory_core::diff::similarity;
///
/// assert_eq!(similarity("Possession of firearms", "Possession  of firearms"), 1.0);
/// assert_eq!(similarity("a b c", "x y z"), 0.0);
/// assert!((similarity("a b c d", "a b c e") - 0.75).abs() < 1e-9);
/// ```
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = tokens(a);
    let b = tokens(b);
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - strsim::generic_levenshtein(&a, &b) as f64 / longest as f64
}
