//! Scope resolution: a node and everything below it.

use std::collections::BTreeSet;

use crate::context::{AppStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{
    ActionItem, Incident, Node, NodeId, NodeIndex, Risk, RiskId, ScopeResult, TreeNode, UserId,
};
use crate::store::{close_after, ScopeReader};

/// Expands `node_id` into its subtree, or every node when `None`.
///
/// The walk is iterative over `list_children` and skips identifiers it has
/// already collected, so inconsistent parent data cannot make it loop.
pub async fn resolve_scope<R>(reader: &R, node_id: Option<NodeId>) -> Result<ScopeResult, AppError>
where
    R: ScopeReader + ?Sized,
{
    let Some(id) = node_id else {
        let nodes = reader.list_all_nodes().await?;
        return Ok(ScopeResult {
            root: None,
            node_ids: nodes.into_iter().map(|n| n.id).collect(),
        });
    };

    let root = reader
        .find_node(id)
        .await?
        .ok_or(AppError::ScopeNotFound(id))?;

    let mut node_ids = BTreeSet::new();
    let mut stack = vec![root.id];
    while let Some(current) = stack.pop() {
        if !node_ids.insert(current) {
            continue;
        }
        for child in reader.list_children(current).await? {
            if !node_ids.contains(&child.id) {
                stack.push(child.id);
            }
        }
    }

    tracing::debug!(node_id = id, nodes = node_ids.len(), "Resolved scope");
    Ok(ScopeResult {
        root: Some(root),
        node_ids,
    })
}

/// Node lookups and scoped record listings.
#[derive(FromContext, Clone)]
pub struct ScopeService {
    store: AppStore,
}

impl ScopeService {
    pub async fn resolve(&self, node_id: Option<NodeId>) -> Result<ScopeResult, AppError> {
        let session = self.store.read().await?;
        let result = resolve_scope(&*session, node_id).await;
        close_after(session, result).await
    }

    pub async fn get_node(&self, id: NodeId) -> Result<Node, AppError> {
        let session = self.store.read().await?;
        let result = session.find_node(id).await;
        close_after(session, result)
            .await?
            .ok_or(AppError::ScopeNotFound(id))
    }

    pub async fn list_nodes(&self) -> Result<Vec<Node>, AppError> {
        let session = self.store.read().await?;
        let result = session.list_all_nodes().await;
        close_after(session, result).await
    }

    /// The whole hierarchy nested under its roots, built from one listing.
    pub async fn tree(&self) -> Result<Vec<TreeNode>, AppError> {
        let nodes = self.list_nodes().await?;
        Ok(NodeIndex::new(nodes).tree())
    }

    /// Risks owned by any node in the scope.
    pub async fn list_risks(&self, node_id: Option<NodeId>) -> Result<Vec<Risk>, AppError> {
        let session = self.store.read().await?;
        let result = async {
            let scope = resolve_scope(&*session, node_id).await?;
            session.list_risks_in(&scope.ids()).await
        }
        .await;
        close_after(session, result).await
    }

    /// Incidents owned by any node in the scope.
    pub async fn list_incidents(&self, node_id: Option<NodeId>) -> Result<Vec<Incident>, AppError> {
        let session = self.store.read().await?;
        let result = async {
            let scope = resolve_scope(&*session, node_id).await?;
            session.list_incidents_in(&scope.ids()).await
        }
        .await;
        close_after(session, result).await
    }

    /// Action items on risks owned by the scope, optionally only those
    /// assigned to one user.
    pub async fn list_actions(
        &self,
        node_id: Option<NodeId>,
        assigned_to: Option<UserId>,
    ) -> Result<Vec<ActionItem>, AppError> {
        let session = self.store.read().await?;
        let result = async {
            let scope = resolve_scope(&*session, node_id).await?;
            let risk_ids: Vec<RiskId> = session
                .list_risks_in(&scope.ids())
                .await?
                .iter()
                .map(|r| r.id)
                .collect();
            let actions: Vec<ActionItem> = session
                .list_actions_for_risks(&risk_ids)
                .await?
                .into_iter()
                .filter(|a| assigned_to.map_or(true, |user| a.assigned_to == user))
                .collect();
            Ok::<_, AppError>(actions)
        }
        .await;
        close_after(session, result).await
    }
}
