//! Dashboard summaries.

use std::sync::Arc;

use crate::config::Config;
use crate::context::{AppStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{DashboardSummary, NodeId};
use crate::services::aggregate::aggregate;
use crate::services::scope::resolve_scope;
use crate::store::close_after;

#[derive(FromContext, Clone)]
pub struct DashboardService {
    store: AppStore,
    config: Arc<Config>,
}

impl DashboardService {
    /// Counts, financial loss and the first records of a scope.
    pub async fn summary(&self, node_id: Option<NodeId>) -> Result<DashboardSummary, AppError> {
        let session = self.store.read().await?;
        let result = async {
            let scope = resolve_scope(&*session, node_id).await?;
            let data = aggregate(&*session, &scope.node_ids).await?;
            Ok::<_, AppError>((scope, data))
        }
        .await;
        let (scope, data) = close_after(session, result).await?;

        let samples = self.config.insights.dashboard_samples;
        Ok(DashboardSummary {
            node_id: scope.root_id(),
            scope_label: scope.label().to_string(),
            counts: data.counts(),
            financial_loss: data.financial_loss(),
            risks: data.risks.into_iter().take(samples).collect(),
            incidents: data.incidents.into_iter().take(samples).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewIncident, NewNode};
    use crate::store::backends::memory::MemoryStore;
    use crate::store::RiskStore;

    #[tokio::test]
    async fn test_summary_totals_financial_losses_only() {
        let store = MemoryStore::new();
        let mut session = store.write().await.unwrap();
        let root = session.create_node(NewNode::root("Root")).await.unwrap();
        for (loss_amount, is_financial) in [(Some(100), true), (Some(50), false), (None, true)] {
            session
                .create_incident(NewIncident {
                    name: "Incident".to_string(),
                    description: None,
                    root_cause: None,
                    loss_amount,
                    is_financial,
                    node_id: root.id,
                })
                .await
                .unwrap();
        }
        session.commit().await.unwrap();

        let service = DashboardService {
            store: Arc::new(store),
            config: Arc::new(Config::default()),
        };
        let summary = service.summary(None).await.unwrap();
        assert_eq!(summary.scope_label, "All Nodes");
        assert_eq!(summary.counts.incidents_count, 3);
        assert_eq!(summary.financial_loss, 100);
        assert_eq!(summary.incidents.len(), 3);
    }
}
