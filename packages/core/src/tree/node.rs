//! Provision tree stored as an arena of nodes addressed by [`NodeId`].
//!
//! Ownership flows root to leaves through `children`; `parent` handles are
//! non-owning and exist for path reconstruction and upward traversal.

use std::collections::HashMap;

use serde::Serialize;

use crate::text::append_text;
use crate::types::{Level, NodeFlag, TreeKey};

/// Stable handle of a node inside one [`ProvisionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in build order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One provision: a section or any subdivision below it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionNode {
    /// Full slash-delimited path, unique within the tree.
    pub identifier: String,
    pub level: Level,
    /// Raw label such as "a", "1", "A", "i" or "I"; `None` for the root.
    pub numbering_token: Option<String>,
    pub heading: Option<String>,
    /// Own direct text, excluding descendants.
    pub text: String,
    /// Identifier as written in nested markup, when one was present.
    pub source_identifier: Option<String>,
    pub flags: Vec<NodeFlag>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ProvisionNode {
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn has_flag(&self, flag: NodeFlag) -> bool {
        self.flags.contains(&flag)
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.has_flag(NodeFlag::Synthetic)
    }
}

/// Immutable provision tree for one (section, year, format).
///
/// Built once by the reconstructor; every accessor takes `&self`, so a
/// tree can be shared across threads behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionTree {
    key: TreeKey,
    nodes: Vec<ProvisionNode>,
    index: HashMap<String, NodeId>,
}

impl ProvisionTree {
    /// Tree holding only the section root.
    pub(crate) fn with_root(key: TreeKey, heading: Option<String>) -> Self {
        let root = ProvisionNode {
            identifier: key.section_id.clone(),
            level: Level::Section,
            numbering_token: None,
            heading,
            text: String::new(),
            source_identifier: None,
            flags: Vec::new(),
            parent: None,
            children: Vec::new(),
        };
        let mut index = HashMap::new();
        index.insert(root.identifier.clone(), NodeId(0));
        Self {
            key,
            nodes: vec![root],
            index,
        }
    }

    /// Append a child under `parent`. The caller guarantees that
    /// `identifier` is not yet in use.
    pub(crate) fn add_child(
        &mut self,
        parent: NodeId,
        level: Level,
        token: String,
        identifier: String,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ProvisionNode {
            identifier: identifier.clone(),
            level,
            numbering_token: Some(token),
            heading: None,
            text: String::new(),
            source_identifier: None,
            flags: Vec::new(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        self.index.insert(identifier, id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ProvisionNode {
        &mut self.nodes[id.0]
    }

    pub(crate) fn append_text(&mut self, id: NodeId, text: &str) {
        append_text(&mut self.nodes[id.0].text, text);
    }

    pub(crate) fn add_flag(&mut self, id: NodeId, flag: NodeFlag) {
        let flags = &mut self.nodes[id.0].flags;
        if !flags.contains(&flag) {
            flags.push(flag);
        }
    }

    #[must_use]
    pub fn key(&self) -> &TreeKey {
        &self.key
    }

    #[must_use]
    pub fn section_id(&self) -> &str {
        &self.key.section_id
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.key.year
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Node for a handle issued by this tree.
    ///
    /// Handles from another tree index into this tree's arena; pass only
    /// handles obtained from the same tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &ProvisionNode {
        &self.nodes[id.0]
    }

    /// Look up a node by its canonical identifier.
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&ProvisionNode> {
        self.index.get(identifier).map(|id| self.node(*id))
    }

    #[must_use]
    pub fn id_of(&self, identifier: &str) -> Option<NodeId> {
        self.index.get(identifier).copied()
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node handles in pre-order (document order).
    #[must_use]
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![self.root()],
        }
    }

    /// Own text of `id` followed by the text of all its descendants.
    #[must_use]
    pub fn subtree_text(&self, id: NodeId) -> String {
        let mut text = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            append_text(&mut text, &self.node(current).text);
            stack.extend(self.children(current).iter().rev());
        }
        text
    }

    /// Identifiers from the root down to `id`.
    #[must_use]
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            path.push(node.identifier.as_str());
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Owned nested view of the tree, suitable for serialization.
    #[must_use]
    pub fn to_view(&self) -> NodeView {
        self.view_of(self.root())
    }

    fn view_of(&self, id: NodeId) -> NodeView {
        let node = self.node(id);
        NodeView {
            identifier: node.identifier.clone(),
            level: node.level,
            numbering_token: node.numbering_token.clone(),
            heading: node.heading.clone(),
            text: node.text.clone(),
            flags: node.flags.clone(),
            children: node.children.iter().map(|c| self.view_of(*c)).collect(),
        }
    }
}

/// Pre-order iterator over node handles.
pub struct PreOrder<'a> {
    tree: &'a ProvisionTree,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev());
        Some(id)
    }
}

/// Serializable nested copy of a node and its descendants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub identifier: String,
    pub level: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbering_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<NodeFlag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeView>,
}
