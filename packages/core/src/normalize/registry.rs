//! Declarative element and style maps for the two markup representations.

use std::collections::{HashMap, HashSet};

use crate::types::Level;

/// Declarative specification of a structural element in nested markup.
#[derive(Debug, Clone)]
pub struct ElementSpec {
    /// XML tag name (without namespace).
    pub tag: String,

    /// Level of provisions marked up with this tag.
    pub level: Level,

    /// Child element that carries the display label, e.g. `num`.
    pub number_source: Option<String>,

    /// Child element that carries the heading.
    pub heading_source: Option<String>,

    /// Child tags holding the element's own text.
    pub content_tags: Vec<String>,
}

impl ElementSpec {
    #[must_use]
    pub fn new(tag: impl Into<String>, level: Level) -> Self {
        Self {
            tag: tag.into(),
            level,
            number_source: None,
            heading_source: None,
            content_tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_number_source(mut self, source: impl Into<String>) -> Self {
        self.number_source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_heading_source(mut self, source: impl Into<String>) -> Self {
        self.heading_source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_content_tags(
        mut self,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.content_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `tag` holds this element's own text.
    #[must_use]
    pub fn is_content_tag(&self, tag: &str) -> bool {
        self.content_tags.iter().any(|t| t == tag)
    }

    /// Whether `tag` is this element's label or heading child.
    #[must_use]
    pub fn is_label_tag(&self, tag: &str) -> bool {
        self.number_source.as_deref() == Some(tag) || self.heading_source.as_deref() == Some(tag)
    }
}

/// Registry of structural element specifications.
pub struct HierarchyRegistry {
    specs: HashMap<String, ElementSpec>,
    skip_tags: HashSet<String>,
}

impl HierarchyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            specs: HashMap::new(),
            skip_tags: HashSet::new(),
        }
    }

    pub fn register(&mut self, spec: ElementSpec) {
        self.specs.insert(spec.tag.clone(), spec);
    }

    /// Mark tags as skip (editorial material with no provision text).
    pub fn skip(&mut self, tag_names: impl IntoIterator<Item = impl Into<String>>) {
        for tag in tag_names {
            self.skip_tags.insert(tag.into());
        }
    }

    #[must_use]
    pub fn get_spec(&self, tag: &str) -> Option<&ElementSpec> {
        self.specs.get(tag)
    }

    #[must_use]
    pub fn should_skip(&self, tag: &str) -> bool {
        self.skip_tags.contains(tag)
    }

    /// Skipped tags, for text extraction that must ignore them.
    #[must_use]
    pub fn skipped_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.skip_tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for HierarchyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the hierarchy registry for nested (USLM-style) markup.
///
/// ```text
/// section
/// ├── num, heading
/// ├── chapeau | content
/// ├── subsection
/// │   └── paragraph
/// │       └── subparagraph
/// │           └── clause
/// │               └── subclause
/// └── continuation
/// ```
#[must_use]
pub fn create_nested_hierarchy() -> HierarchyRegistry {
    let mut registry = HierarchyRegistry::new();

    for level in Level::ALL {
        registry.register(
            ElementSpec::new(level.as_str(), level)
                .with_number_source("num")
                .with_heading_source("heading")
                .with_content_tags(["chapeau", "content", "continuation"]),
        );
    }

    registry.skip(["notes", "note", "sourceCredit", "toc", "meta"]);
    registry
}

/// Style key of a styled block and the level it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSpec {
    pub key: String,
    pub level: Level,
    /// Block variant: carries no numbering, continues the open node.
    pub continuation: bool,
}

/// Fixed map from style keys to levels.
pub struct StyleRegistry {
    styles: HashMap<String, StyleSpec>,
}

impl StyleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            styles: HashMap::new(),
        }
    }

    pub fn register(&mut self, key: impl Into<String>, level: Level, continuation: bool) {
        let key = key.into();
        self.styles.insert(
            key.clone(),
            StyleSpec {
                key,
                level,
                continuation,
            },
        );
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StyleSpec> {
        self.styles.get(key)
    }

    /// First class in a space-separated class list that is a known style.
    #[must_use]
    pub fn resolve(&self, classes: &str) -> Option<&StyleSpec> {
        classes.split_whitespace().find_map(|class| self.get(class))
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Base style key of styled body text.
pub const BASE_STYLE: &str = "statutory-body";

/// Class marking the section heading in styled markup.
pub const SECTION_HEAD_CLASS: &str = "section-head";

/// Class marking a provision heading inside a styled block.
pub const HEADING_CLASS: &str = "heading";

/// Create the style registry for styled markup.
///
/// The base style maps to subsections; each additional indent step
/// (`-1em` … `-4em`) goes one level deeper. Every style has a `-block`
/// continuation variant.
#[must_use]
pub fn create_style_registry() -> StyleRegistry {
    let mut registry = StyleRegistry::new();

    for (step, level) in Level::ALL.iter().skip(1).enumerate() {
        let suffix = if step == 0 {
            String::new()
        } else {
            format!("-{step}em")
        };
        registry.register(format!("{BASE_STYLE}{suffix}"), *level, false);
        registry.register(format!("{BASE_STYLE}-block{suffix}"), *level, true);
    }

    registry
}
