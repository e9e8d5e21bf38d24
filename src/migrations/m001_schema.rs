//! Schema migration - hierarchy and risk register tables.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::AppError;
use crate::migrations::Migration;
use crate::store::backends::postgres::PostgresSession;

/// Core tables and foreign-key indexes.
pub struct M001Schema;

impl Migration for M001Schema {
    fn id(&self) -> &'static str {
        "m001_schema"
    }

    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "Schema setup (nodes, users, risks, incidents, action items)"
    }

    fn up<'a>(&'a self, session: &'a PostgresSession) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            session
                .execute_sql(
                    r#"
                    CREATE TABLE IF NOT EXISTS nodes (
                        id BIGSERIAL PRIMARY KEY,
                        name TEXT NOT NULL,
                        parent_id BIGINT REFERENCES nodes (id),
                        level INTEGER NOT NULL
                    );

                    CREATE TABLE IF NOT EXISTS users (
                        id BIGSERIAL PRIMARY KEY,
                        username TEXT NOT NULL UNIQUE,
                        email TEXT NOT NULL UNIQUE,
                        node_id BIGINT NOT NULL REFERENCES nodes (id),
                        level INTEGER NOT NULL,
                        is_active BOOLEAN NOT NULL DEFAULT TRUE
                    );

                    CREATE TABLE IF NOT EXISTS risks (
                        id BIGSERIAL PRIMARY KEY,
                        title TEXT NOT NULL,
                        description TEXT,
                        node_id BIGINT NOT NULL REFERENCES nodes (id),
                        risk_type TEXT,
                        status TEXT,
                        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );

                    CREATE TABLE IF NOT EXISTS incidents (
                        id BIGSERIAL PRIMARY KEY,
                        name TEXT NOT NULL,
                        description TEXT,
                        root_cause TEXT,
                        loss_amount BIGINT,
                        is_financial BOOLEAN NOT NULL DEFAULT FALSE,
                        node_id BIGINT NOT NULL REFERENCES nodes (id),
                        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );

                    CREATE TABLE IF NOT EXISTS action_items (
                        id BIGSERIAL PRIMARY KEY,
                        description TEXT NOT NULL,
                        risk_id BIGINT NOT NULL REFERENCES risks (id),
                        assigned_to BIGINT NOT NULL REFERENCES users (id),
                        status TEXT,
                        due_date TIMESTAMPTZ
                    );
                    "#,
                )
                .await?;

            session
                .execute_sql(
                    r#"
                    CREATE INDEX IF NOT EXISTS nodes_parent_id_idx ON nodes (parent_id);
                    CREATE INDEX IF NOT EXISTS users_node_id_idx ON users (node_id);
                    CREATE INDEX IF NOT EXISTS risks_node_id_idx ON risks (node_id);
                    CREATE INDEX IF NOT EXISTS incidents_node_id_idx ON incidents (node_id);
                    CREATE INDEX IF NOT EXISTS action_items_risk_id_idx ON action_items (risk_id);
                    "#,
                )
                .await?;

            Ok(())
        }
        .boxed()
    }
}
