//! Schema migrations for PostgreSQL with version tracking.
//!
//! Migrations are:
//! - **Idempotent**: Use `IF NOT EXISTS` - required for safe retries
//! - **Forward-only**: No rollback support - create compensating migrations if needed
//! - **Version-tracked**: Schema version stored in the `schema_version` table
//! - **Transactional**: Each migration runs in its own transaction

mod m001_schema;
mod runner;
mod traits;

pub use m001_schema::M001Schema;
pub use runner::{run_migrations, MigrationResult};
pub use traits::{Migration, Register};

/// Create the migrations register in version order.
pub fn create_register() -> Register {
    Register::new().register(M001Schema)
}
