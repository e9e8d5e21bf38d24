//! Application context providing dependency injection root.

use std::sync::Arc;

use crate::config::Config;
use crate::di::{Context as ContextDerive, FromRef};
use crate::error::AppError;
use crate::provider::{self, TextGenerator};
use crate::store::backends::postgres::PostgresStore;
use crate::store::RiskStore;

/// Shared handle to the storage collaborator.
pub type AppStore = Arc<dyn RiskStore>;

/// Shared handle to the provider selected at startup.
pub type AppGenerator = Arc<dyn TextGenerator>;

/// Root application context for dependency injection.
///
/// Every field gets a generated `FromRef<Context>` impl, so services that
/// derive `FromContext` resolve their fields from here.
#[derive(ContextDerive, Clone)]
pub struct Context {
    pub store: AppStore,
    pub generator: AppGenerator,
    pub config: Arc<Config>,
}

impl Context {
    /// Creates a context from already-built dependencies.
    pub fn new(store: AppStore, generator: AppGenerator, config: Config) -> Self {
        Self {
            store,
            generator,
            config: Arc::new(config),
        }
    }

    /// Connects to PostgreSQL and builds the configured provider.
    pub async fn from(config: Config) -> Result<Self, AppError> {
        tracing::info!("Connecting to PostgreSQL");
        let store = PostgresStore::connect(&config.postgres).await?;

        let generator = provider::build(&config.provider)?;
        tracing::info!(
            provider = generator.name(),
            kind = %config.provider.kind,
            "Text generation provider selected"
        );

        Ok(Self::new(Arc::new(store), generator, config))
    }

    /// Resolve a dependency from the context.
    pub fn resolve<T: FromRef<Context>>(&self) -> T {
        T::from_ref(self)
    }
}
