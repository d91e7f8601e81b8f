//! Provision trees and the hierarchy reconstructor that builds them.

mod build;
mod node;

pub use build::{build_tree, TreeBuilder};
pub use node::{NodeId, NodeView, PreOrder, ProvisionNode, ProvisionTree};
