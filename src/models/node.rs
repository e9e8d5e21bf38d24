//! Node model: one vertex of the organizational hierarchy.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// A region, segment or business unit in the hierarchy.
///
/// Children are not stored on the node; they are found by looking up
/// nodes whose `parent_id` equals this node's `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// `None` for a root.
    pub parent_id: Option<NodeId>,
    /// Depth level, 1 at the root.
    pub level: i32,
}

/// Fields for inserting a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNode {
    pub name: String,
    pub parent_id: Option<NodeId>,
    pub level: i32,
}

impl NewNode {
    /// A root node at level 1.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            level: 1,
        }
    }

    /// A child one level below `parent`.
    pub fn child_of(parent: &Node, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: Some(parent.id),
            level: parent.level + 1,
        }
    }
}
