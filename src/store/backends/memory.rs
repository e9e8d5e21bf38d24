//! In-memory backend.
//!
//! The dataset lives behind an `Arc` and is never mutated in place: a read
//! session clones the `Arc` and keeps a frozen snapshot, a write session
//! edits its own copy (`Arc::make_mut`) and publishes it on commit. Two
//! concurrent writers do not merge; the last commit wins.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::{
    ActionItem, Incident, NewActionItem, NewIncident, NewNode, NewRisk, NewUser, Node, NodeId,
    Risk, RiskId, User,
};
use crate::store::{RecordReader, ReadSession, RiskStore, RiskWriter, ScopeReader, WriteSession};

#[derive(Debug, Clone, Default)]
struct Dataset {
    nodes: BTreeMap<NodeId, Node>,
    users: BTreeMap<i64, User>,
    risks: BTreeMap<RiskId, Risk>,
    incidents: BTreeMap<i64, Incident>,
    actions: BTreeMap<i64, ActionItem>,
}

impl Dataset {
    /// Next identifier for a table, mirroring a serial column.
    fn next_id<V>(table: &BTreeMap<i64, V>) -> i64 {
        table.keys().next_back().map_or(1, |last| last + 1)
    }
}

/// In-memory store, cheap to clone.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<Arc<Dataset>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RiskStore for MemoryStore {
    async fn read(&self) -> Result<Box<dyn ReadSession>, AppError> {
        let snapshot = self.data.read().await.clone();
        Ok(Box::new(MemorySession {
            data: snapshot,
            publish_to: None,
        }))
    }

    async fn write(&self) -> Result<Box<dyn WriteSession>, AppError> {
        let snapshot = self.data.read().await.clone();
        Ok(Box::new(MemorySession {
            data: snapshot,
            publish_to: Some(self.data.clone()),
        }))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// A session over one dataset version.
///
/// Read sessions have no `publish_to` target and reject writes.
pub struct MemorySession {
    data: Arc<Dataset>,
    publish_to: Option<Arc<RwLock<Arc<Dataset>>>>,
}

impl MemorySession {
    fn data_mut(&mut self) -> Result<&mut Dataset, AppError> {
        if self.publish_to.is_none() {
            return Err(AppError::ReadOnly);
        }
        Ok(Arc::make_mut(&mut self.data))
    }

    fn require_node(&self, id: NodeId) -> Result<(), AppError> {
        if self.data.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(AppError::Validation(format!("node {} does not exist", id)))
        }
    }
}

#[async_trait]
impl ScopeReader for MemorySession {
    async fn find_node(&self, id: NodeId) -> Result<Option<Node>, AppError> {
        Ok(self.data.nodes.get(&id).cloned())
    }

    async fn list_all_nodes(&self) -> Result<Vec<Node>, AppError> {
        Ok(self.data.nodes.values().cloned().collect())
    }

    async fn list_children(&self, parent_id: NodeId) -> Result<Vec<Node>, AppError> {
        Ok(self
            .data
            .nodes
            .values()
            .filter(|n| n.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn list_risks_in(&self, node_ids: &[NodeId]) -> Result<Vec<Risk>, AppError> {
        Ok(self
            .data
            .risks
            .values()
            .filter(|r| node_ids.contains(&r.node_id))
            .cloned()
            .collect())
    }

    async fn list_incidents_in(&self, node_ids: &[NodeId]) -> Result<Vec<Incident>, AppError> {
        Ok(self
            .data
            .incidents
            .values()
            .filter(|i| node_ids.contains(&i.node_id))
            .cloned()
            .collect())
    }

    async fn list_actions_for_risks(
        &self,
        risk_ids: &[RiskId],
    ) -> Result<Vec<ActionItem>, AppError> {
        Ok(self
            .data
            .actions
            .values()
            .filter(|a| risk_ids.contains(&a.risk_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecordReader for MemorySession {
    async fn find_risk(&self, id: RiskId) -> Result<Option<Risk>, AppError> {
        Ok(self.data.risks.get(&id).cloned())
    }

    async fn find_incident(&self, id: i64) -> Result<Option<Incident>, AppError> {
        Ok(self.data.incidents.get(&id).cloned())
    }

    async fn find_action_item(&self, id: i64) -> Result<Option<ActionItem>, AppError> {
        Ok(self.data.actions.get(&id).cloned())
    }
}

#[async_trait]
impl RiskWriter for MemorySession {
    async fn reset(&mut self) -> Result<(), AppError> {
        *self.data_mut()? = Dataset::default();
        Ok(())
    }

    async fn create_node(&mut self, node: NewNode) -> Result<Node, AppError> {
        if let Some(parent_id) = node.parent_id {
            self.require_node(parent_id)?;
        }
        let data = self.data_mut()?;
        let node = Node {
            id: Dataset::next_id(&data.nodes),
            name: node.name,
            parent_id: node.parent_id,
            level: node.level,
        };
        data.nodes.insert(node.id, node.clone());
        Ok(node)
    }

    async fn create_user(&mut self, user: NewUser) -> Result<User, AppError> {
        self.require_node(user.node_id)?;
        if self.data.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Validation(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        let data = self.data_mut()?;
        let user = User {
            id: Dataset::next_id(&data.users),
            username: user.username,
            email: user.email,
            node_id: user.node_id,
            level: user.level,
            is_active: user.is_active,
        };
        data.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create_risk(&mut self, risk: NewRisk) -> Result<Risk, AppError> {
        self.require_node(risk.node_id)?;
        let data = self.data_mut()?;
        let risk = Risk {
            id: Dataset::next_id(&data.risks),
            title: risk.title,
            description: risk.description,
            node_id: risk.node_id,
            risk_type: risk.risk_type,
            status: risk.status,
            created_at: Utc::now(),
        };
        data.risks.insert(risk.id, risk.clone());
        Ok(risk)
    }

    async fn create_incident(&mut self, incident: NewIncident) -> Result<Incident, AppError> {
        self.require_node(incident.node_id)?;
        let data = self.data_mut()?;
        let incident = Incident {
            id: Dataset::next_id(&data.incidents),
            name: incident.name,
            description: incident.description,
            root_cause: incident.root_cause,
            loss_amount: incident.loss_amount,
            is_financial: incident.is_financial,
            node_id: incident.node_id,
            created_at: Utc::now(),
        };
        data.incidents.insert(incident.id, incident.clone());
        Ok(incident)
    }

    async fn create_action_item(&mut self, item: NewActionItem) -> Result<ActionItem, AppError> {
        if !self.data.risks.contains_key(&item.risk_id) {
            return Err(AppError::Validation(format!(
                "risk {} does not exist",
                item.risk_id
            )));
        }
        if !self.data.users.contains_key(&item.assigned_to) {
            return Err(AppError::Validation(format!(
                "user {} does not exist",
                item.assigned_to
            )));
        }
        let data = self.data_mut()?;
        let item = ActionItem {
            id: Dataset::next_id(&data.actions),
            description: item.description,
            risk_id: item.risk_id,
            assigned_to: item.assigned_to,
            status: item.status,
            due_date: item.due_date,
        };
        data.actions.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .data
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users_at(&self, node_id: NodeId) -> Result<Vec<User>, AppError> {
        Ok(self
            .data
            .users
            .values()
            .filter(|u| u.node_id == node_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReadSession for MemorySession {
    async fn close(&mut self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl WriteSession for MemorySession {
    async fn commit(&mut self) -> Result<(), AppError> {
        let target = self.publish_to.take().ok_or(AppError::ReadOnly)?;
        *target.write().await = self.data.clone();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        self.publish_to = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        let mut session = store.write().await.unwrap();
        session.create_node(NewNode::root("Root")).await.unwrap();

        let reader = store.read().await.unwrap();
        assert!(reader.list_all_nodes().await.unwrap().is_empty());

        session.commit().await.unwrap();
        let reader = store.read().await.unwrap();
        assert_eq!(reader.list_all_nodes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_read_snapshot_is_stable_across_commits() {
        let store = MemoryStore::new();
        let mut session = store.write().await.unwrap();
        let root = session.create_node(NewNode::root("Root")).await.unwrap();
        session.commit().await.unwrap();

        let snapshot = store.read().await.unwrap();

        let mut session = store.write().await.unwrap();
        session
            .create_node(NewNode::child_of(&root, "Africa"))
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert!(snapshot.list_children(root.id).await.unwrap().is_empty());
        let fresh = store.read().await.unwrap();
        assert_eq!(fresh.list_children(root.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let store = MemoryStore::new();
        let mut session = store.write().await.unwrap();
        session.create_node(NewNode::root("Root")).await.unwrap();
        session.rollback().await.unwrap();

        assert!(store.read().await.unwrap().list_all_nodes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_risk_requires_existing_node() {
        let store = MemoryStore::new();
        let mut session = store.write().await.unwrap();
        let err = session
            .create_risk(NewRisk {
                title: "Orphan".to_string(),
                description: None,
                node_id: 7,
                risk_type: None,
                status: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_record_lookups_by_id() {
        let store = MemoryStore::new();
        let mut session = store.write().await.unwrap();
        let root = session.create_node(NewNode::root("Root")).await.unwrap();
        let risk = session
            .create_risk(NewRisk {
                title: "Vendor outage".to_string(),
                description: None,
                node_id: root.id,
                risk_type: None,
                status: None,
            })
            .await
            .unwrap();
        session.commit().await.unwrap();

        let reader = store.read().await.unwrap();
        assert_eq!(reader.find_risk(risk.id).await.unwrap(), Some(risk));
        assert!(reader.find_incident(1).await.unwrap().is_none());
        assert!(reader.find_action_item(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_restarts_identifiers() {
        let store = MemoryStore::new();
        let mut session = store.write().await.unwrap();
        session.create_node(NewNode::root("First")).await.unwrap();
        session.reset().await.unwrap();
        let node = session.create_node(NewNode::root("Second")).await.unwrap();
        assert_eq!(node.id, 1);
    }
}
