//! In-memory adjacency index over a node listing.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::{Node, NodeId};

/// A node with its children nested, for hierarchy views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    pub level: i32,
    pub children: Vec<TreeNode>,
}

/// Nodes indexed by identifier and by parent identifier.
///
/// The tree walk is iterative and tracks visited identifiers, so corrupt
/// parent data (joins or cycles) cannot loop or recurse without bound.
#[derive(Debug, Default)]
pub struct NodeIndex {
    nodes: HashMap<NodeId, Node>,
    children: HashMap<Option<NodeId>, Vec<NodeId>>,
}

impl NodeIndex {
    pub fn new(nodes: Vec<Node>) -> Self {
        let mut children: HashMap<Option<NodeId>, Vec<NodeId>> = HashMap::new();
        for node in &nodes {
            children.entry(node.parent_id).or_default().push(node.id);
        }
        for ids in children.values_mut() {
            ids.sort_unstable();
        }

        Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
            children,
        }
    }

    /// Direct children of `parent` (roots for `None`), ascending by id.
    pub fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The hierarchy as nested trees, one per root.
    pub fn tree(&self) -> Vec<TreeNode> {
        let roots = self.children_of(None);

        // Pre-order walk: every parent precedes its children.
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            order.push(id);
            stack.extend(self.children_of(Some(id)).iter().rev());
        }

        // Build bottom-up so each child is finished before its parent.
        let mut built: HashMap<NodeId, TreeNode> = HashMap::new();
        for id in order.into_iter().rev() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let children = self
                .children_of(Some(id))
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(
                id,
                TreeNode {
                    id,
                    name: node.name.clone(),
                    level: node.level,
                    children,
                },
            );
        }

        roots.iter().filter_map(|id| built.remove(id)).collect()
    }
}
