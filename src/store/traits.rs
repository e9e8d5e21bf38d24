//! Core traits for storage access.
//!
//! - [`ScopeReader`] - Read operations the insight core consumes
//! - [`RecordReader`] - Single-record lookups by identifier
//! - [`RiskWriter`] - Inserts used by the API, the seeder and tests
//! - [`ReadSession`] / [`WriteSession`] - Session lifecycle
//! - [`RiskStore`] - Session factory

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    ActionItem, Incident, NewActionItem, NewIncident, NewNode, NewRisk, NewUser, Node, NodeId,
    Risk, RiskId, User,
};

/// Read access to nodes and the records attached to them.
///
/// Listings are ordered by ascending identifier.
#[async_trait]
pub trait ScopeReader: Send + Sync {
    async fn find_node(&self, id: NodeId) -> Result<Option<Node>, AppError>;

    async fn list_all_nodes(&self) -> Result<Vec<Node>, AppError>;

    /// Nodes whose parent reference equals `parent_id`.
    async fn list_children(&self, parent_id: NodeId) -> Result<Vec<Node>, AppError>;

    /// Risks owned by any node in `node_ids`.
    async fn list_risks_in(&self, node_ids: &[NodeId]) -> Result<Vec<Risk>, AppError>;

    /// Incidents owned by any node in `node_ids`.
    async fn list_incidents_in(&self, node_ids: &[NodeId]) -> Result<Vec<Incident>, AppError>;

    /// Action items attached to any risk in `risk_ids`.
    async fn list_actions_for_risks(
        &self,
        risk_ids: &[RiskId],
    ) -> Result<Vec<ActionItem>, AppError>;
}

/// Lookups of individual records by identifier.
#[async_trait]
pub trait RecordReader: Send + Sync {
    async fn find_risk(&self, id: RiskId) -> Result<Option<Risk>, AppError>;

    async fn find_incident(&self, id: i64) -> Result<Option<Incident>, AppError>;

    async fn find_action_item(&self, id: i64) -> Result<Option<ActionItem>, AppError>;
}

/// Inserts for populating a store.
#[async_trait]
pub trait RiskWriter: Send + Sync {
    /// Deletes every record and restarts identifier sequences.
    async fn reset(&mut self) -> Result<(), AppError>;

    async fn create_node(&mut self, node: NewNode) -> Result<Node, AppError>;

    async fn create_user(&mut self, user: NewUser) -> Result<User, AppError>;

    async fn create_risk(&mut self, risk: NewRisk) -> Result<Risk, AppError>;

    async fn create_incident(&mut self, incident: NewIncident) -> Result<Incident, AppError>;

    async fn create_action_item(&mut self, item: NewActionItem) -> Result<ActionItem, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Users attached directly to `node_id`.
    async fn list_users_at(&self, node_id: NodeId) -> Result<Vec<User>, AppError>;
}

/// A consistent read-only snapshot.
#[async_trait]
pub trait ReadSession: ScopeReader + RecordReader {
    /// Ends the snapshot.
    async fn close(&mut self) -> Result<(), AppError>;
}

/// A write transaction; changes are invisible until [`commit`](WriteSession::commit).
#[async_trait]
pub trait WriteSession: ScopeReader + RiskWriter {
    async fn commit(&mut self) -> Result<(), AppError>;

    async fn rollback(&mut self) -> Result<(), AppError>;
}

/// A storage backend that opens sessions.
#[async_trait]
pub trait RiskStore: Send + Sync {
    async fn read(&self) -> Result<Box<dyn ReadSession>, AppError>;

    async fn write(&self) -> Result<Box<dyn WriteSession>, AppError>;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<(), AppError>;
}
