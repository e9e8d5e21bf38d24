//! Dashboard summary for a scope.

use serde::Serialize;

use super::{Counts, Incident, NodeId, Risk};

/// Counts, loss total and the first few records of a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub node_id: Option<NodeId>,
    pub scope_label: String,
    #[serde(flatten)]
    pub counts: Counts,
    pub financial_loss: i64,
    pub risks: Vec<Risk>,
    pub incidents: Vec<Incident>,
}
