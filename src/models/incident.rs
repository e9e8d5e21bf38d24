//! Incident model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NodeId;

/// An incident recorded against a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub root_cause: Option<String>,
    pub loss_amount: Option<i64>,
    /// Only financial incidents count toward the loss total.
    pub is_financial: bool,
    pub node_id: NodeId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIncident {
    pub name: String,
    pub description: Option<String>,
    pub root_cause: Option<String>,
    pub loss_amount: Option<i64>,
    pub is_financial: bool,
    pub node_id: NodeId,
}
