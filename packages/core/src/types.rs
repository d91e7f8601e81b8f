//! Core data types shared by the normalizer, reconstructor and diff engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rank of a provision in the fixed nesting order.
///
/// Ordering follows depth: `Section < Subsection < ... < Subclause`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Section,
    Subsection,
    Paragraph,
    Subparagraph,
    Clause,
    Subclause,
}

impl Level {
    /// All levels, shallowest first.
    pub const ALL: [Level; 6] = [
        Level::Section,
        Level::Subsection,
        Level::Paragraph,
        Level::Subparagraph,
        Level::Clause,
        Level::Subclause,
    ];

    /// Depth below the section (section = 0).
    #[must_use]
    pub fn depth(self) -> usize {
        self as usize
    }

    /// Level at the given depth, if any.
    #[must_use]
    pub fn from_depth(depth: usize) -> Option<Self> {
        Self::ALL.get(depth).copied()
    }

    /// The next deeper level, or `None` for subclauses.
    #[must_use]
    pub fn deeper(self) -> Option<Self> {
        Self::from_depth(self.depth() + 1)
    }

    /// The next shallower level, or `None` for sections.
    #[must_use]
    pub fn shallower(self) -> Option<Self> {
        self.depth().checked_sub(1).and_then(Self::from_depth)
    }

    /// Lowercase name, also used as the element name in nested markup.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Subsection => "subsection",
            Self::Paragraph => "paragraph",
            Self::Subparagraph => "subparagraph",
            Self::Clause => "clause",
            Self::Subclause => "subclause",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markup representation of a raw extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Nested markup with a full-path `identifier` attribute per element.
    Nested,
    /// Flat sequence of styled text blocks; nesting is inferred.
    Styled,
}

impl SourceFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nested => "nested",
            Self::Styled => "styled",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recoverable structural diagnostics attached to items and nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeFlag {
    /// Placeholder inserted to bridge a level gap.
    Synthetic,
    /// Continuation text with no open node at its level.
    OrphanContinuation,
    /// Styled block whose style key is not in the style map.
    UnrecognizedStyle,
    /// Nested element with no known level.
    UnrecognizedElement,
    /// Numbered style without a bracketed label.
    MissingNumbering,
    /// Numbering token already used by a sibling.
    DuplicateNumbering,
}

/// One flat item produced by the normalizer.
///
/// Items without a numbering token are continuations: their text attaches
/// to the node already open at their level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlatItem {
    pub level: Option<Level>,
    pub numbering_token: Option<String>,
    pub heading: Option<String>,
    pub text: String,
    pub explicit_identifier: Option<String>,
    pub flags: Vec<NodeFlag>,
}

impl FlatItem {
    /// A numbered item that opens a new node.
    #[must_use]
    pub fn numbered(level: Level, token: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: Some(level),
            numbering_token: Some(token.into()),
            text: text.into(),
            ..Self::default()
        }
    }

    /// A continuation item at `level`.
    #[must_use]
    pub fn continuation(level: Level, text: impl Into<String>) -> Self {
        Self {
            level: Some(level),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Text whose level could not be determined; it attaches to the
    /// deepest open node.
    #[must_use]
    pub fn detached(text: impl Into<String>, flag: NodeFlag) -> Self {
        Self {
            level: None,
            text: text.into(),
            flags: vec![flag],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_heading(mut self, heading: Option<String>) -> Self {
        self.heading = heading;
        self
    }

    #[must_use]
    pub fn with_explicit_identifier(mut self, identifier: Option<String>) -> Self {
        self.explicit_identifier = identifier;
        self
    }

    #[must_use]
    pub fn with_flag(mut self, flag: NodeFlag) -> Self {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        self
    }

    /// Whether this item continues an existing node.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.numbering_token.is_none()
    }
}

/// Identity of one provision tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeKey {
    pub section_id: String,
    pub year: i32,
    pub format: SourceFormat,
}

impl TreeKey {
    #[must_use]
    pub fn new(section_id: impl Into<String>, year: i32, format: SourceFormat) -> Self {
        Self {
            section_id: section_id.into(),
            year,
            format,
        }
    }
}

impl fmt::Display for TreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.section_id, self.year, self.format)
    }
}
