//! Insight result returned to presentation callers.

use serde::{Deserialize, Serialize};

use super::{Counts, Incident, NodeId, Risk};

/// Generated text for a scope.
///
/// Chat-style providers answer one combined prompt; the tabular provider
/// answers one summary per record kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Narrative {
    Combined {
        text: String,
    },
    Tabular {
        risks: String,
        incidents: String,
        actions: String,
    },
}

/// Insight for a scope: label, counts, generated narrative and samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightResult {
    pub node_id: Option<NodeId>,
    pub scope_label: String,
    #[serde(flatten)]
    pub counts: Counts,
    pub financial_loss: i64,
    pub narrative: Narrative,
    pub risks: Vec<Risk>,
    pub incidents: Vec<Incident>,
}
