//! Insight service: resolve, aggregate, compose.

use std::sync::Arc;

use crate::config::Config;
use crate::context::{AppGenerator, AppStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{InsightResult, NodeId};
use crate::provider::{GenerateRequest, Task};
use crate::services::aggregate::aggregate;
use crate::services::composer::compose_insight;
use crate::services::scope::resolve_scope;
use crate::store::close_after;

/// Entry point for scope insights and free-text generation.
#[derive(FromContext, Clone)]
pub struct InsightService {
    store: AppStore,
    generator: AppGenerator,
    config: Arc<Config>,
}

impl InsightService {
    /// Insight for `node_id`'s subtree, or for every node when `None`.
    ///
    /// Records are read from one snapshot, which is released before the
    /// provider is called. Provider failures propagate.
    pub async fn get_scope_insight(&self, node_id: Option<NodeId>) -> Result<InsightResult, AppError> {
        let session = self.store.read().await?;
        let result = async {
            let scope = resolve_scope(&*session, node_id).await?;
            let data = aggregate(&*session, &scope.node_ids).await?;
            Ok::<_, AppError>((scope, data))
        }
        .await;
        let (scope, data) = close_after(session, result).await?;

        let narrative = compose_insight(&*self.generator, scope.label(), &data).await?;
        tracing::info!(
            scope = scope.label(),
            provider = self.generator.name(),
            "Composed insight"
        );

        let samples = self.config.insights.insight_samples;
        Ok(InsightResult {
            node_id: scope.root_id(),
            scope_label: scope.label().to_string(),
            counts: data.counts(),
            financial_loss: data.financial_loss(),
            narrative,
            risks: data.risks.into_iter().take(samples).collect(),
            incidents: data.incidents.into_iter().take(samples).collect(),
        })
    }

    /// Passes free text straight to the provider.
    pub async fn generate(&self, text: &str, task: Option<Task>) -> Result<String, AppError> {
        let request = GenerateRequest {
            prompt: text.to_string(),
            table: None,
            task,
        };
        Ok(self.generator.generate(&request).await?)
    }
}
