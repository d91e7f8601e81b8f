//! Recursive tree diff over aligned sibling lists.

use super::align::{align, AlignStep};
use super::change::{ChangeRecord, ChangeSet, ChangeType};
use super::similarity::similarity;
use crate::config::EngineConfig;
use crate::error::{CoreError, Result};
use crate::tree::{NodeId, ProvisionTree};
use crate::types::NodeFlag;

/// Diffs provision trees of the same section.
///
/// The engine holds only configuration; it is `Send + Sync` and can be
/// shared by any number of concurrent diffs.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: EngineConfig,
}

impl DiffEngine {
    /// Create an engine, rejecting an invalid configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the change set from `from` to `to`.
    ///
    /// # Errors
    /// `SectionMismatch` when the trees belong to different sections.
    pub fn diff(&self, from: &ProvisionTree, to: &ProvisionTree) -> Result<ChangeSet> {
        if from.section_id() != to.section_id() {
            return Err(CoreError::SectionMismatch {
                from: from.section_id().to_string(),
                to: to.section_id().to_string(),
            });
        }

        let pass = Pass {
            from,
            to,
            config: &self.config,
        };
        let records = pass.diff_children(from.root(), to.root());

        let set = ChangeSet {
            section_id: to.section_id().to_string(),
            from_year: from.year(),
            to_year: to.year(),
            records,
        };

        let summary = set.summary();
        tracing::debug!(
            section = %set.section_id,
            from_year = set.from_year,
            to_year = set.to_year,
            added = summary.added,
            removed = summary.removed,
            modified = summary.modified,
            unchanged = summary.unchanged,
            "Diff computed"
        );

        Ok(set)
    }
}

/// Diff two trees with the default configuration.
///
/// # Arguments
/// * `from` - Tree of the earlier year
/// * `to` - Tree of the later year, for the same section
///
/// # Returns
/// One record per top-level subdivision, each carrying the records of its
/// descendants. The section root itself gets no record.
///
/// # Errors
/// `SectionMismatch` when the trees belong to different sections.
///
/// # Examples
/// ```
/// use lexhistory_core::{diff, normalize, SourceFormat, TreeKey};
///
/// let xml = r#"<section identifier="/s1"><subsection identifier="/s1/a">
///     <num value="a">(a)</num><content>Text.</content></subsection></section>"#;
/// let from = normalize(xml, &TreeKey::new("/s1", 2010, SourceFormat::Nested)).unwrap();
/// let to = normalize(xml, &TreeKey::new("/s1", 2015, SourceFormat::Nested)).unwrap();
///
/// let changes = diff(&from, &to).unwrap();
/// assert!(!changes.has_changes());
/// ```
pub fn diff(from: &ProvisionTree, to: &ProvisionTree) -> Result<ChangeSet> {
    DiffEngine::default().diff(from, to)
}

/// One diff invocation over a fixed tree pair.
struct Pass<'a> {
    from: &'a ProvisionTree,
    to: &'a ProvisionTree,
    config: &'a EngineConfig,
}

impl Pass<'_> {
    fn diff_children(&self, from_parent: NodeId, to_parent: NodeId) -> Vec<ChangeRecord> {
        let from_children = self.from.children(from_parent);
        let to_children = self.to.children(to_parent);

        let steps = align(
            from_children.len(),
            to_children.len(),
            self.config.similarity_threshold,
            |i, j| self.alignment_similarity(from_children[i], to_children[j]),
        );

        steps
            .into_iter()
            .map(|step| match step {
                AlignStep::Matched { from, to, .. } => {
                    self.compare(from_children[from], to_children[to])
                }
                AlignStep::Removed(i) => {
                    one_sided(self.from, from_children[i], ChangeType::Removed)
                }
                AlignStep::Added(j) => one_sided(self.to, to_children[j], ChangeType::Added),
            })
            .collect()
    }

    /// Own text drives alignment. When either side carries no own text
    /// (placeholders, pure containers) the pair aligns on subtree text.
    fn alignment_similarity(&self, from: NodeId, to: NodeId) -> f64 {
        let a = self.from.node(from);
        let b = self.to.node(to);
        if a.text.is_empty() || b.text.is_empty() {
            similarity(&self.from.subtree_text(from), &self.to.subtree_text(to))
        } else {
            similarity(&a.text, &b.text)
        }
    }

    fn compare(&self, from_id: NodeId, to_id: NodeId) -> ChangeRecord {
        let from = self.from.node(from_id);
        let to = self.to.node(to_id);

        let sim = similarity(&from.text, &to.text);
        let heading_changed = from.heading != to.heading;
        let (change_type, magnitude) = if sim >= 1.0 && !heading_changed {
            (ChangeType::Unchanged, 0.0)
        } else {
            (ChangeType::Modified, (1.0 - sim).clamp(0.0, 1.0))
        };

        let renumbered =
            self.config.track_renumbering && from.numbering_token != to.numbering_token;

        let mut flags: Vec<NodeFlag> = from.flags.clone();
        for flag in &to.flags {
            if !flags.contains(flag) {
                flags.push(*flag);
            }
        }

        ChangeRecord {
            node_identifier_from: Some(from.identifier.clone()),
            node_identifier_to: Some(to.identifier.clone()),
            level: to.level,
            change_type,
            magnitude,
            text_delta: char_len(&to.text) - char_len(&from.text),
            heading_changed,
            renumbered,
            flags,
            children: self.diff_children(from_id, to_id),
        }
    }
}

/// Record for a node present on one side only; every descendant gets the
/// same change type with full magnitude.
fn one_sided(tree: &ProvisionTree, id: NodeId, change_type: ChangeType) -> ChangeRecord {
    let node = tree.node(id);
    let len = char_len(&node.text);
    let (from, to, text_delta) = match change_type {
        ChangeType::Removed => (Some(node.identifier.clone()), None, -len),
        _ => (None, Some(node.identifier.clone()), len),
    };

    ChangeRecord {
        node_identifier_from: from,
        node_identifier_to: to,
        level: node.level,
        change_type,
        magnitude: 1.0,
        text_delta,
        heading_changed: false,
        renumbered: false,
        flags: node.flags.clone(),
        children: tree
            .children(id)
            .iter()
            .map(|child| one_sided(tree, *child, change_type))
            .collect(),
    }
}

fn char_len(text: &str) -> i64 {
    i64::try_from(text.chars().count()).unwrap_or(i64::MAX)
}
