//! Record aggregation over a resolved scope.

use std::collections::BTreeSet;

use crate::error::AppError;
use crate::models::{Aggregate, NodeId, RiskId};
use crate::store::ScopeReader;

/// Every risk and incident owned by a node in `node_ids`, plus the action
/// items of those risks.
///
/// Actions are scoped through their risk, not through a node of their own.
pub async fn aggregate<R>(reader: &R, node_ids: &BTreeSet<NodeId>) -> Result<Aggregate, AppError>
where
    R: ScopeReader + ?Sized,
{
    if node_ids.is_empty() {
        return Ok(Aggregate::default());
    }

    let ids: Vec<NodeId> = node_ids.iter().copied().collect();
    let risks = reader.list_risks_in(&ids).await?;
    let incidents = reader.list_incidents_in(&ids).await?;

    let risk_ids: Vec<RiskId> = risks.iter().map(|r| r.id).collect();
    let actions = if risk_ids.is_empty() {
        Vec::new()
    } else {
        reader.list_actions_for_risks(&risk_ids).await?
    };

    tracing::debug!(
        risks = risks.len(),
        incidents = incidents.len(),
        actions = actions.len(),
        "Aggregated scope"
    );
    Ok(Aggregate {
        risks,
        incidents,
        actions,
    })
}
