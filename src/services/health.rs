//! Liveness of the store and the provider.

use serde::Serialize;

use crate::context::{AppGenerator, AppStore, Context};
use crate::di::FromContext;
use crate::provider::GenerateRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Health {
    pub db: bool,
    pub ai: bool,
}

#[derive(FromContext, Clone)]
pub struct HealthService {
    store: AppStore,
    generator: AppGenerator,
}

impl HealthService {
    /// Never fails; each check reports `false` instead.
    pub async fn check(&self) -> Health {
        let db = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                false
            }
        };

        let ai = match self
            .generator
            .generate(&GenerateRequest::text("health check"))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(provider = self.generator.name(), error = %e, "Provider health check failed");
                false
            }
        };

        Health { db, ai }
    }
}
