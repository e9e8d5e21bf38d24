//! Domain models for the risk hierarchy.

mod action_item;
mod aggregate;
mod dashboard;
mod incident;
mod insight;
mod node;
mod risk;
mod scope;
mod tree;
mod user;

pub use action_item::{ActionItem, NewActionItem};
pub use aggregate::{Aggregate, Counts};
pub use dashboard::DashboardSummary;
pub use incident::{Incident, NewIncident};
pub use insight::{InsightResult, Narrative};
pub use node::{NewNode, Node};
pub use risk::{NewRisk, Risk};
pub use scope::{ScopeResult, ALL_NODES_LABEL};
pub use tree::{NodeIndex, TreeNode};
pub use user::{NewUser, User};

/// Identifier of a node in the hierarchy.
pub type NodeId = i64;
/// Identifier of a risk.
pub type RiskId = i64;
/// Identifier of a user.
pub type UserId = i64;
