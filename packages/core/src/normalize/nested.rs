//! Normalizer for nested markup (explicit nesting, full-path identifiers).

use roxmltree::{Document, Node};

use super::numbering::{clean_label, validate_token};
use super::registry::{create_nested_hierarchy, ElementSpec, HierarchyRegistry};
use super::NormalizedSection;
use crate::error::{CoreError, Result};
use crate::text::{append_text, normalize_text};
use crate::types::{FlatItem, Level, NodeFlag};
use crate::xml::{collect_text, find_child, get_tag_name};

/// Flattens one `section` element into items in document order.
pub struct NestedNormalizer {
    registry: HierarchyRegistry,
}

impl NestedNormalizer {
    #[must_use]
    pub fn new(registry: HierarchyRegistry) -> Self {
        Self { registry }
    }

    /// Normalize the section identified by `section_id` in `raw`.
    ///
    /// # Errors
    /// `XmlParse` for malformed markup, `SectionNotFound` when no section
    /// element carries `section_id`, `InvalidNumbering` for tokens outside
    /// their level's alphabet.
    pub fn normalize(&self, raw: &str, section_id: &str) -> Result<NormalizedSection> {
        let doc = Document::parse(raw)?;

        let section = doc
            .descendants()
            .find(|n| {
                n.is_element()
                    && get_tag_name(*n) == Level::Section.as_str()
                    && n.attribute("identifier") == Some(section_id)
            })
            .ok_or_else(|| CoreError::SectionNotFound {
                section_id: section_id.to_string(),
            })?;

        let spec = self
            .registry
            .get_spec(Level::Section.as_str())
            .ok_or_else(|| CoreError::MissingElement {
                element: Level::Section.as_str().to_string(),
                context: "hierarchy registry".to_string(),
            })?;

        let heading = self.heading(section, spec);
        let mut items = Vec::new();
        self.walk(section, spec, &mut items)?;

        Ok(NormalizedSection { heading, items })
    }

    /// Emit the item for `node` (sections emit only their own text) and
    /// recurse into structural children.
    ///
    /// Bare text directly inside `node` counts as content: before the first
    /// structural child it joins the node's own text, after it it becomes a
    /// continuation of the node.
    fn walk(&self, node: Node<'_, '_>, spec: &ElementSpec, items: &mut Vec<FlatItem>) -> Result<()> {
        let level = spec.level;
        let children: Vec<_> = node
            .children()
            .filter(|c| {
                if c.is_text() {
                    !bare_text(*c).is_empty()
                } else {
                    c.is_element() && !self.registry.should_skip(get_tag_name(*c))
                }
            })
            .collect();

        let first_structural = children
            .iter()
            .position(|c| self.structural_spec(*c).is_some());
        let (leading, trailing) = children.split_at(first_structural.unwrap_or(children.len()));

        let mut own_text = String::new();
        let mut leading_unknown = Vec::new();
        for child in leading {
            let tag = get_tag_name(*child);
            if child.is_text() {
                append_text(&mut own_text, &bare_text(*child));
            } else if spec.is_content_tag(tag) {
                append_text(&mut own_text, &self.text_of(*child));
            } else if !spec.is_label_tag(tag) {
                leading_unknown.push(*child);
            }
        }

        if level == Level::Section {
            if !own_text.is_empty() {
                items.push(FlatItem::continuation(level, own_text));
            }
        } else {
            match self.numbering_token(node, spec)? {
                Some(token) => items.push(
                    FlatItem::numbered(level, token, own_text)
                        .with_heading(self.heading(node, spec))
                        .with_explicit_identifier(node.attribute("identifier").map(String::from)),
                ),
                None => {
                    tracing::warn!(
                        tag = %spec.tag,
                        "Structural element without numbering, folding into parent"
                    );
                    let parent_level = level.shallower().unwrap_or(Level::Section);
                    items.push(
                        FlatItem::continuation(parent_level, own_text)
                            .with_flag(NodeFlag::MissingNumbering),
                    );
                }
            }
        }

        for child in leading_unknown {
            self.push_unrecognized(child, level, items);
        }

        for child in trailing {
            let tag = get_tag_name(*child);
            if child.is_text() {
                items.push(FlatItem::continuation(level, bare_text(*child)));
            } else if let Some(child_spec) = self.structural_spec(*child) {
                self.walk(*child, child_spec, items)?;
            } else if spec.is_content_tag(tag) {
                let text = self.text_of(*child);
                if !text.is_empty() {
                    items.push(FlatItem::continuation(level, text));
                }
            } else if !spec.is_label_tag(tag) {
                self.push_unrecognized(*child, level, items);
            }
        }

        Ok(())
    }

    /// Spec for a structural child element. Nested sections are not
    /// structural children.
    fn structural_spec(&self, node: Node<'_, '_>) -> Option<&ElementSpec> {
        self.registry
            .get_spec(get_tag_name(node))
            .filter(|spec| spec.level != Level::Section)
    }

    /// Fold an element with no known level into the enclosing node.
    fn push_unrecognized(&self, node: Node<'_, '_>, level: Level, items: &mut Vec<FlatItem>) {
        let text = self.text_of(node);
        tracing::warn!(
            tag = %get_tag_name(node),
            identifier = node.attribute("identifier").unwrap_or(""),
            "Unrecognized element, folding text into enclosing provision"
        );
        if !text.is_empty() {
            items.push(
                FlatItem::continuation(level, text).with_flag(NodeFlag::UnrecognizedElement),
            );
        }
    }

    /// Numbering token: last identifier segment, else the label child.
    fn numbering_token(&self, node: Node<'_, '_>, spec: &ElementSpec) -> Result<Option<String>> {
        let from_identifier = node
            .attribute("identifier")
            .and_then(|id| id.rsplit('/').next())
            .and_then(clean_label);

        let token = from_identifier.or_else(|| {
            let num = find_child(node, spec.number_source.as_deref()?)?;
            num.attribute("value")
                .and_then(clean_label)
                .or_else(|| clean_label(&collect_text(num, &[])))
        });

        if let Some(token) = &token {
            validate_token(spec.level, token)?;
        }
        Ok(token)
    }

    fn heading(&self, node: Node<'_, '_>, spec: &ElementSpec) -> Option<String> {
        let heading = find_child(node, spec.heading_source.as_deref()?)?;
        Some(self.text_of(heading)).filter(|h| !h.is_empty())
    }

    fn text_of(&self, node: Node<'_, '_>) -> String {
        normalize_text(&collect_text(node, &self.registry.skipped_tags()))
    }
}

fn bare_text(node: Node<'_, '_>) -> String {
    normalize_text(node.text().unwrap_or(""))
}

impl Default for NestedNormalizer {
    fn default() -> Self {
        Self::new(create_nested_hierarchy())
    }
}
