//! Format normalizer: turns either markup representation into an ordered
//! sequence of flat items.
//!
//! - [`NestedNormalizer`]: explicit nesting, level and identifier read
//!   directly from each element.
//! - [`StyledNormalizer`]: flat styled blocks, level inferred from the
//!   style key and numbering parsed from a leading bracketed label.

mod nested;
mod numbering;
mod registry;
mod styled;

pub use nested::NestedNormalizer;
pub use numbering::{clean_label, is_valid_token, split_leading_label, validate_token};
pub use registry::{
    create_nested_hierarchy, create_style_registry, ElementSpec, HierarchyRegistry, StyleRegistry,
    StyleSpec,
};
pub use styled::StyledNormalizer;

use crate::config::validate_section_id;
use crate::error::Result;
use crate::tree::{build_tree, ProvisionTree};
use crate::types::{FlatItem, SourceFormat, TreeKey};

/// Normalizer output for one section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedSection {
    /// Heading of the section itself.
    pub heading: Option<String>,
    /// Items below the section, in document order.
    pub items: Vec<FlatItem>,
}

/// Normalize raw markup of the given format into flat items.
pub fn normalize_items(raw: &str, format: SourceFormat, section_id: &str) -> Result<NormalizedSection> {
    validate_section_id(section_id)?;
    match format {
        SourceFormat::Nested => NestedNormalizer::default().normalize(raw, section_id),
        SourceFormat::Styled => StyledNormalizer::default().normalize(raw, section_id),
    }
}

/// Normalize raw markup and reconstruct the provision tree for `key`.
///
/// # Arguments
/// * `raw` - The extract markup, in the representation named by `key.format`
/// * `key` - Section, year and source format of the extract
///
/// # Returns
/// The provision tree rooted at the section, with every irregularity that
/// could be recovered from recorded as a node flag.
///
/// # Errors
/// `InvalidSectionId`, `XmlParse`, `SectionNotFound` or `InvalidNumbering`.
///
/// # Examples
/// ```
/// use lexhistory_core::{normalize, SourceFormat, TreeKey};
///
/// let raw = r#"<div><p class="statutory-body">(a) Whoever possesses a firearm.</p></div>"#;
/// let key = TreeKey::new("/us/usc/t18/s922", 2020, SourceFormat::Styled);
/// let tree = normalize(raw, &key).unwrap();
///
/// assert!(tree.get("/us/usc/t18/s922/a").is_some());
/// ```
pub fn normalize(raw: &str, key: &TreeKey) -> Result<ProvisionTree> {
    let section = normalize_items(raw, key.format, &key.section_id)?;
    build_tree(key.clone(), section)
}
