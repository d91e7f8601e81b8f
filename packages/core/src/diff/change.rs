//! Change records produced by the diff engine.

use std::fmt;

use serde::Serialize;

use crate::types::{Level, NodeFlag};

/// How a provision changed between two years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl ChangeType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change of one provision, with the changes of its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    /// Identifier in the earlier tree; `None` when added.
    pub node_identifier_from: Option<String>,
    /// Identifier in the later tree; `None` when removed.
    pub node_identifier_to: Option<String>,
    pub level: Level,
    pub change_type: ChangeType,
    /// Dissimilarity in `[0, 1]`.
    pub magnitude: f64,
    /// Character count of the later text minus that of the earlier text.
    pub text_delta: i64,
    pub heading_changed: bool,
    /// Matched by content while its numbering token changed.
    pub renumbered: bool,
    /// Structural flags carried by either side.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<NodeFlag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChangeRecord>,
}

impl ChangeRecord {
    /// The most recent identifier of this provision.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.node_identifier_to
            .as_deref()
            .or(self.node_identifier_from.as_deref())
            .unwrap_or_default()
    }

    /// This record and all descendants, pre-order.
    pub fn walk(&self) -> impl Iterator<Item = &ChangeRecord> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let record = stack.pop()?;
            stack.extend(record.children.iter().rev());
            Some(record)
        })
    }
}

/// All changes to one section between two years.
///
/// The section node itself is never reported; `records` starts at the
/// subsection level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSet {
    pub section_id: String,
    pub from_year: i32,
    pub to_year: i32,
    pub records: Vec<ChangeRecord>,
}

/// Count of records per change type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl ChangeSet {
    /// Every record, pre-order across top-level records.
    pub fn iter(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().flat_map(|r| r.walk())
    }

    /// Record whose earlier or later identifier equals `identifier`,
    /// preferring a match on the later identifier.
    #[must_use]
    pub fn find(&self, identifier: &str) -> Option<&ChangeRecord> {
        self.iter()
            .find(|r| r.node_identifier_to.as_deref() == Some(identifier))
            .or_else(|| {
                self.iter()
                    .find(|r| r.node_identifier_from.as_deref() == Some(identifier))
            })
    }

    #[must_use]
    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for record in self.iter() {
            match record.change_type {
                ChangeType::Added => summary.added += 1,
                ChangeType::Removed => summary.removed += 1,
                ChangeType::Modified => summary.modified += 1,
                ChangeType::Unchanged => summary.unchanged += 1,
            }
        }
        summary
    }

    /// Whether any provision changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.iter()
            .any(|r| r.change_type != ChangeType::Unchanged)
    }
}
