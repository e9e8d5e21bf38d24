//! Aggregated records for a scope.

use serde::{Deserialize, Serialize};

use super::{ActionItem, Incident, Risk};

/// Every risk, incident and action item in a scope, unpaginated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub risks: Vec<Risk>,
    pub incidents: Vec<Incident>,
    pub actions: Vec<ActionItem>,
}

/// Record counts for a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub risks_count: usize,
    pub incidents_count: usize,
    pub actions_count: usize,
}

impl Aggregate {
    pub fn counts(&self) -> Counts {
        Counts {
            risks_count: self.risks.len(),
            incidents_count: self.incidents.len(),
            actions_count: self.actions.len(),
        }
    }

    /// Sum of `loss_amount` over financial incidents; missing amounts count as zero.
    pub fn financial_loss(&self) -> i64 {
        self.incidents
            .iter()
            .filter(|i| i.is_financial)
            .filter_map(|i| i.loss_amount)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.risks.is_empty() && self.incidents.is_empty() && self.actions.is_empty()
    }
}
