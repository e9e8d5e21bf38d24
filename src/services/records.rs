//! Single-record lookups and creation.

use crate::context::{AppStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{
    ActionItem, Incident, NewIncident, NewNode, NewRisk, Node, NodeId, Risk, RiskId,
};
use crate::store::{close_after, commit_after, ScopeReader};

#[derive(FromContext, Clone)]
pub struct RecordService {
    store: AppStore,
}

impl RecordService {
    pub async fn get_risk(&self, id: RiskId) -> Result<Risk, AppError> {
        let session = self.store.read().await?;
        let result = session.find_risk(id).await;
        close_after(session, result)
            .await?
            .ok_or(AppError::NotFound { kind: "Risk", id })
    }

    pub async fn get_incident(&self, id: i64) -> Result<Incident, AppError> {
        let session = self.store.read().await?;
        let result = session.find_incident(id).await;
        close_after(session, result)
            .await?
            .ok_or(AppError::NotFound {
                kind: "Incident",
                id,
            })
    }

    pub async fn get_action_item(&self, id: i64) -> Result<ActionItem, AppError> {
        let session = self.store.read().await?;
        let result = session.find_action_item(id).await;
        close_after(session, result)
            .await?
            .ok_or(AppError::NotFound {
                kind: "Action item",
                id,
            })
    }

    /// Inserts a node under an existing parent, or as a root.
    pub async fn create_node(&self, node: NewNode) -> Result<Node, AppError> {
        require_text("name", &node.name)?;
        let mut session = self.store.write().await?;
        let result = async {
            if let Some(parent_id) = node.parent_id {
                require_node(&*session, parent_id).await?;
            }
            session.create_node(node).await
        }
        .await;
        let node = commit_after(session, result).await?;
        tracing::info!(id = node.id, name = %node.name, "Created node");
        Ok(node)
    }

    pub async fn create_risk(&self, risk: NewRisk) -> Result<Risk, AppError> {
        require_text("title", &risk.title)?;
        let mut session = self.store.write().await?;
        let result = async {
            require_node(&*session, risk.node_id).await?;
            session.create_risk(risk).await
        }
        .await;
        let risk = commit_after(session, result).await?;
        tracing::info!(id = risk.id, node_id = risk.node_id, "Created risk");
        Ok(risk)
    }

    pub async fn create_incident(&self, incident: NewIncident) -> Result<Incident, AppError> {
        require_text("name", &incident.name)?;
        let mut session = self.store.write().await?;
        let result = async {
            require_node(&*session, incident.node_id).await?;
            session.create_incident(incident).await
        }
        .await;
        let incident = commit_after(session, result).await?;
        tracing::info!(id = incident.id, node_id = incident.node_id, "Created incident");
        Ok(incident)
    }
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// A missing node is a validation error on every backend.
async fn require_node<R>(reader: &R, id: NodeId) -> Result<(), AppError>
where
    R: ScopeReader + ?Sized,
{
    match reader.find_node(id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!("node {} does not exist", id))),
    }
}
