//! Scope model: a node plus its descendants, or the whole hierarchy.

use std::collections::BTreeSet;

use serde::Serialize;

use super::{Node, NodeId};

/// Label used when no scope node was requested.
pub const ALL_NODES_LABEL: &str = "All Nodes";

/// Node identifiers belonging to a queried scope.
///
/// Derived per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeResult {
    /// The requested node, or `None` for the whole hierarchy.
    pub root: Option<Node>,
    pub node_ids: BTreeSet<NodeId>,
}

impl ScopeResult {
    /// Display name of the scope.
    pub fn label(&self) -> &str {
        self.root
            .as_ref()
            .map(|n| n.name.as_str())
            .unwrap_or(ALL_NODES_LABEL)
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root.as_ref().map(|n| n.id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node_ids.contains(&id)
    }

    /// Identifiers in ascending order, ready for an `= ANY($1)` parameter.
    pub fn ids(&self) -> Vec<NodeId> {
        self.node_ids.iter().copied().collect()
    }
}
