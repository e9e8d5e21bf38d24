//! Risk model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NodeId, RiskId};

/// A risk owned by a node.
///
/// `risk_type` and `status` are free-form tags (e.g. `third_party`,
/// `regulatory`; `open`, `in progress`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub id: RiskId,
    pub title: String,
    pub description: Option<String>,
    pub node_id: NodeId,
    pub risk_type: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRisk {
    pub title: String,
    pub description: Option<String>,
    pub node_id: NodeId,
    pub risk_type: Option<String>,
    pub status: Option<String>,
}
