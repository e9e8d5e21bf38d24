//! Migration runner with version tracking.

use crate::error::AppError;
use crate::migrations::create_register;
use crate::store::backends::postgres::PostgresStore;
use crate::store::WriteSession;

/// Result of running migrations.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub previous_version: u32,
    pub current_version: u32,
    pub applied_migrations: Vec<String>,
}

/// Run all pending migrations.
pub async fn run_migrations(store: &PostgresStore) -> Result<MigrationResult, AppError> {
    ensure_schema_version_table(store).await?;

    let previous_version = get_schema_version(store).await?;
    let register = create_register();

    let (current_version, applied) = register.run_pending(store, previous_version).await?;

    for migration_id in &applied {
        let version = register
            .iter()
            .find(|m| m.id() == migration_id)
            .map(|m| m.version())
            .unwrap_or(current_version);
        update_schema_version(store, version, migration_id).await?;
    }

    Ok(MigrationResult {
        previous_version,
        current_version,
        applied_migrations: applied,
    })
}

const CREATE_SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY DEFAULT 1 CHECK (id = 1),
    version INTEGER NOT NULL DEFAULT 0,
    applied_migrations TEXT[] NOT NULL DEFAULT '{}',
    last_applied_at TIMESTAMPTZ DEFAULT NOW()
);
INSERT INTO schema_version (id, version) VALUES (1, 0) ON CONFLICT (id) DO NOTHING;
"#;

async fn ensure_schema_version_table(store: &PostgresStore) -> Result<(), AppError> {
    let mut session = store.begin(false).await?;
    session.execute_sql(CREATE_SCHEMA_VERSION_TABLE).await?;
    session.commit().await
}

async fn get_schema_version(store: &PostgresStore) -> Result<u32, AppError> {
    let mut session = store.begin(false).await?;
    let row = session
        .query_one("SELECT version FROM schema_version WHERE id = 1", &[])
        .await?;
    session.commit().await?;

    Ok(row.try_get::<_, i32>("version").unwrap_or(0).max(0) as u32)
}

async fn update_schema_version(
    store: &PostgresStore,
    version: u32,
    migration_id: &str,
) -> Result<(), AppError> {
    let mut session = store.begin(false).await?;
    session
        .execute(
            "UPDATE schema_version
             SET version = $1,
                 applied_migrations = array_append(applied_migrations, $2),
                 last_applied_at = NOW()
             WHERE id = 1",
            &[&(version as i32), &migration_id],
        )
        .await?;
    session.commit().await
}
