//! Action item model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RiskId, UserId};

/// A remediation step for a risk.
///
/// Action items have no node of their own; they belong to a scope through
/// the node of their risk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: i64,
    pub description: String,
    pub risk_id: RiskId,
    pub assigned_to: UserId,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActionItem {
    pub description: String,
    pub risk_id: RiskId,
    pub assigned_to: UserId,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}
