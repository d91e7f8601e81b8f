//! Hierarchy reconstructor: one left-to-right pass over flat items with a
//! stack of open nodes, one slot per level.

use super::node::{NodeId, ProvisionTree};
use crate::config::{MAX_DEPTH, SYNTHETIC_TOKEN};
use crate::error::{CoreError, Result};
use crate::normalize::{validate_token, NormalizedSection};
use crate::types::{FlatItem, Level, NodeFlag, TreeKey};

/// Build the provision tree for `key` from normalized items.
///
/// # Errors
/// `InvalidNumbering` when a numbered item sits at section level or its
/// token is outside its level's alphabet. Every other irregularity is
/// recovered from and recorded as a node flag.
pub fn build_tree(key: TreeKey, section: NormalizedSection) -> Result<ProvisionTree> {
    let mut builder = TreeBuilder::new(key, section.heading);
    for item in section.items {
        builder.push(item)?;
    }
    Ok(builder.finish())
}

/// Incremental reconstructor. `stack[d]` holds the open node at depth `d`;
/// slot 0 is always the section root.
pub struct TreeBuilder {
    tree: ProvisionTree,
    stack: [Option<NodeId>; MAX_DEPTH],
}

impl TreeBuilder {
    #[must_use]
    pub fn new(key: TreeKey, heading: Option<String>) -> Self {
        let tree = ProvisionTree::with_root(key, heading);
        let mut stack = [None; MAX_DEPTH];
        stack[0] = Some(tree.root());
        Self { tree, stack }
    }

    /// Consume one flat item.
    pub fn push(&mut self, item: FlatItem) -> Result<()> {
        match (item.level, item.numbering_token.clone()) {
            (Some(level), Some(token)) => self.open(level, token, item),
            (Some(level), None) => {
                self.continue_at(level, &item);
                Ok(())
            }
            (None, _) => {
                self.attach_detached(&item);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn finish(self) -> ProvisionTree {
        tracing::debug!(
            key = %self.tree.key(),
            nodes = self.tree.len(),
            "Provision tree built"
        );
        self.tree
    }

    /// Depth of the deepest open node.
    fn deepest(&self) -> usize {
        self.stack.iter().rposition(Option::is_some).unwrap_or(0)
    }

    fn open_at(&self, depth: usize) -> NodeId {
        self.stack[depth].unwrap_or_else(|| self.tree.root())
    }

    /// Close every node deeper than `depth`.
    fn close_below(&mut self, depth: usize) {
        for slot in self.stack.iter_mut().skip(depth + 1) {
            *slot = None;
        }
    }

    fn open(&mut self, level: Level, token: String, item: FlatItem) -> Result<()> {
        if level == Level::Section {
            return Err(CoreError::InvalidNumbering { token, level });
        }
        validate_token(level, &token)?;

        let depth = level.depth();
        self.close_below(depth - 1);

        let mut parent_depth = self.deepest();
        let mut parent = self.open_at(parent_depth);

        if parent_depth + 1 < depth {
            tracing::warn!(
                identifier = %self.tree.node(parent).identifier,
                token = %token,
                from = %self.tree.node(parent).level,
                to = %level,
                "Level gap, inserting synthetic placeholders"
            );
        }
        while parent_depth + 1 < depth {
            parent_depth += 1;
            let gap_level = Level::from_depth(parent_depth).unwrap_or(level);
            parent = match self.trailing_placeholder(parent) {
                Some(placeholder) => placeholder,
                None => {
                    let created = self.create(parent, gap_level, SYNTHETIC_TOKEN);
                    self.tree.add_flag(created, NodeFlag::Synthetic);
                    created
                }
            };
            self.stack[parent_depth] = Some(parent);
        }

        let id = self.create(parent, level, &token);
        let node = self.tree.node_mut(id);
        node.heading = item.heading;
        node.source_identifier = item.explicit_identifier;
        for flag in item.flags {
            self.tree.add_flag(id, flag);
        }
        self.tree.append_text(id, &item.text);
        self.stack[depth] = Some(id);
        Ok(())
    }

    /// A placeholder that is still the last child of `parent`. A gap below
    /// the same parent reopens it, so placeholders never collide.
    fn trailing_placeholder(&self, parent: NodeId) -> Option<NodeId> {
        let last = *self.tree.children(parent).last()?;
        self.tree.node(last).is_synthetic().then_some(last)
    }

    /// Create a child, disambiguating a token already used by a sibling.
    fn create(&mut self, parent: NodeId, level: Level, token: &str) -> NodeId {
        let base = format!("{}/{}", self.tree.node(parent).identifier, token);
        if self.tree.id_of(&base).is_none() {
            return self.tree.add_child(parent, level, token.to_string(), base);
        }

        let mut n = 2;
        let (token, identifier) = loop {
            let candidate = format!("{token}~{n}");
            let identifier = format!("{}/{}", self.tree.node(parent).identifier, candidate);
            if self.tree.id_of(&identifier).is_none() {
                break (candidate, identifier);
            }
            n += 1;
        };

        let id = self.tree.add_child(parent, level, token, identifier);
        if token_is_real(&self.tree.node(id).numbering_token) {
            tracing::warn!(
                identifier = %self.tree.node(id).identifier,
                "Duplicate numbering among siblings, disambiguated"
            );
            self.tree.add_flag(id, NodeFlag::DuplicateNumbering);
        }
        id
    }

    /// Attach continuation text to the node open at `level`, or to the
    /// nearest shallower open node as an orphan.
    fn continue_at(&mut self, level: Level, item: &FlatItem) {
        let depth = level.depth();
        self.close_below(depth);

        let target = match self.stack[depth] {
            Some(id) => id,
            None => {
                let id = self.open_at(self.deepest());
                tracing::warn!(
                    identifier = %self.tree.node(id).identifier,
                    level = %level,
                    "Orphan continuation, attaching to nearest open provision"
                );
                self.tree.add_flag(id, NodeFlag::OrphanContinuation);
                id
            }
        };
        self.attach(target, item);
    }

    /// Text of unknown level goes to the deepest open node.
    fn attach_detached(&mut self, item: &FlatItem) {
        let target = self.open_at(self.deepest());
        self.attach(target, item);
    }

    fn attach(&mut self, target: NodeId, item: &FlatItem) {
        self.tree.append_text(target, &item.text);
        for flag in &item.flags {
            self.tree.add_flag(target, *flag);
        }
        if self.tree.node(target).heading.is_none() {
            self.tree.node_mut(target).heading = item.heading.clone();
        }
    }
}

fn token_is_real(token: &Option<String>) -> bool {
    token
        .as_deref()
        .is_some_and(|t| !t.starts_with(SYNTHETIC_TOKEN))
}
