//! Migration trait and registry.

use futures::future::BoxFuture;

use crate::error::AppError;
use crate::store::backends::postgres::{PostgresSession, PostgresStore};
use crate::store::WriteSession;

/// A versioned schema change.
///
/// Uses `BoxFuture` so implementations can borrow the session without
/// `'static` bounds.
pub trait Migration: Send + Sync {
    fn id(&self) -> &'static str;
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up<'a>(&'a self, session: &'a PostgresSession) -> BoxFuture<'a, Result<(), AppError>>;
}

/// Ordered set of migrations.
#[derive(Default)]
pub struct Register {
    migrations: Vec<Box<dyn Migration>>,
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    /// Iterate over migrations.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    /// Run all pending migrations above `current_version`.
    /// Each migration runs in its own transaction.
    /// Returns (new_version, applied_migration_ids).
    pub async fn run_pending(
        &self,
        store: &PostgresStore,
        current_version: u32,
    ) -> Result<(u32, Vec<String>), AppError> {
        let mut applied = vec![];
        let mut new_version = current_version;

        for migration in self.iter() {
            if migration.version() <= current_version {
                continue;
            }

            tracing::info!(
                "Applying migration {} (v{}): {}",
                migration.id(),
                migration.version(),
                migration.description()
            );

            let mut session = store.begin(false).await?;
            match migration.up(&session).await {
                Ok(()) => session.commit().await?,
                Err(e) => {
                    tracing::error!("Migration {} failed: {}", migration.id(), e);
                    session.rollback().await?;
                    return Err(e);
                }
            }

            new_version = migration.version();
            applied.push(migration.id().to_string());
        }

        Ok((new_version, applied))
    }
}
