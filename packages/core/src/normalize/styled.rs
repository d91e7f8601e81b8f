//! Normalizer for styled markup: a flat sequence of `<p class="...">`
//! blocks whose level is encoded in the style key.

use roxmltree::{Document, Node};

use super::numbering::{split_leading_label, validate_token};
use super::registry::{create_style_registry, StyleRegistry, HEADING_CLASS, SECTION_HEAD_CLASS};
use super::NormalizedSection;
use crate::error::Result;
use crate::text::normalize_text;
use crate::types::{FlatItem, NodeFlag};
use crate::xml::{collect_text, get_tag_name, has_class};

/// Separators that may follow an inline heading, e.g. "In general.—".
const HEADING_SEPARATORS: &[char] = &['.', ',', ':', ';', '-', '\u{2013}', '\u{2014}'];

/// Turns styled blocks into flat items.
pub struct StyledNormalizer {
    styles: StyleRegistry,
}

impl StyledNormalizer {
    #[must_use]
    pub fn new(styles: StyleRegistry) -> Self {
        Self { styles }
    }

    /// Normalize a styled extract.
    ///
    /// Styled extracts hold exactly one section, so `section_id` is only
    /// used for diagnostics.
    ///
    /// # Errors
    /// `XmlParse` for malformed markup, `InvalidNumbering` for a label
    /// outside its level's alphabet.
    pub fn normalize(&self, raw: &str, section_id: &str) -> Result<NormalizedSection> {
        let doc = Document::parse(raw)?;

        let heading = doc
            .descendants()
            .find(|n| n.is_element() && has_class(*n, SECTION_HEAD_CLASS))
            .map(|n| normalize_text(&collect_text(n, &[])))
            .filter(|h| !h.is_empty());

        // The section head is reported as the section heading, never as a block.
        let mut items = Vec::new();
        for block in doc.descendants().filter(|n| {
            n.is_element() && get_tag_name(*n) == "p" && !has_class(*n, SECTION_HEAD_CLASS)
        }) {
            if let Some(item) = self.block_item(block, section_id)? {
                items.push(item);
            }
        }

        Ok(NormalizedSection { heading, items })
    }

    fn block_item(&self, block: Node<'_, '_>, section_id: &str) -> Result<Option<FlatItem>> {
        let classes = block.attribute("class").unwrap_or("");

        let Some(style) = self.styles.resolve(classes) else {
            let text = normalize_text(&collect_text(block, &[]));
            tracing::warn!(
                section = %section_id,
                style = %classes,
                "Unrecognized style key, attaching text to current provision"
            );
            if text.is_empty() {
                return Ok(None);
            }
            return Ok(Some(FlatItem::detached(text, NodeFlag::UnrecognizedStyle)));
        };

        if style.continuation {
            let text = normalize_text(&collect_text(block, &[]));
            if text.is_empty() {
                return Ok(None);
            }
            return Ok(Some(FlatItem::continuation(style.level, text)));
        }

        let (heading, body) = split_heading(block);
        let Some((label, rest)) = split_leading_label(&body) else {
            tracing::warn!(
                section = %section_id,
                style = %style.key,
                "Numbered style without a bracketed label, treating as continuation"
            );
            let text = join_heading(heading, &body);
            return Ok(Some(
                FlatItem::continuation(style.level, text).with_flag(NodeFlag::MissingNumbering),
            ));
        };

        validate_token(style.level, label)?;

        let text = if heading.is_some() {
            rest.trim_start_matches(|c: char| c.is_whitespace() || HEADING_SEPARATORS.contains(&c))
        } else {
            rest
        };

        Ok(Some(
            FlatItem::numbered(style.level, label, normalize_text(text)).with_heading(heading),
        ))
    }
}

impl Default for StyledNormalizer {
    fn default() -> Self {
        Self::new(create_style_registry())
    }
}

/// Separate an inline heading element from the block's body text.
fn split_heading(block: Node<'_, '_>) -> (Option<String>, String) {
    let mut heading = None;
    let mut body = String::new();

    for child in block.children() {
        if child.is_text() {
            body.push_str(child.text().unwrap_or(""));
        } else if child.is_element() {
            if heading.is_none() && has_class(child, HEADING_CLASS) {
                heading = Some(normalize_text(&collect_text(child, &[]))).filter(|h| !h.is_empty());
            } else {
                body.push_str(&collect_text(child, &[]));
            }
        }
    }

    (heading, normalize_text(&body))
}

fn join_heading(heading: Option<String>, body: &str) -> String {
    match heading {
        Some(h) => normalize_text(&format!("{h} {body}")),
        None => body.to_string(),
    }
}
