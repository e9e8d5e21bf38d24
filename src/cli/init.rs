//! Init command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::migrations::run_migrations;
use crate::store::backends::postgres::PostgresStore;

use super::App;

impl App {
    /// Run the init command to initialize the database schema.
    pub async fn run_init(&self) -> Result<()> {
        let config = Config::load_with_dotenv()?;

        tracing::info!("Connecting to PostgreSQL");
        let store = PostgresStore::connect(&config.postgres)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;

        tracing::info!("Running migrations...");
        let result = run_migrations(&store)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Migration failed: {}", e))?;

        if result.applied_migrations.is_empty() {
            tracing::info!(
                "Database already at v{}, no migrations needed",
                result.current_version
            );
        } else {
            tracing::info!(
                "Migrations complete: v{} -> v{}, applied: {:?}",
                result.previous_version,
                result.current_version,
                result.applied_migrations
            );
        }

        Ok(())
    }
}
