//! Text normalization shared by the normalizer and the diff engine.

use unicode_normalization::UnicodeNormalization;

/// Normalize extracted text: NFC composition, whitespace runs collapsed to
/// a single space, leading and trailing whitespace removed.
///
/// # Examples
/// ```
/// use lexhistory_core::text::normalize_text;
///
/// assert_eq!(normalize_text("  Possession \n\t of  firearms "), "Possession of firearms");
/// ```
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append `extra` to `text`, separated by a single space.
pub fn append_text(text: &mut String, extra: &str) {
    if extra.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(extra);
}

/// Whitespace tokens of already-normalized text.
pub fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
