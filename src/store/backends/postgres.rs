//! PostgreSQL backend implementation.
//!
//! # Example
//!
//! ```ignore
//! use risk_insights::config::PostgresConfig;
//! use risk_insights::store::backends::postgres::PostgresStore;
//! use risk_insights::store::RiskStore;
//!
//! let store = PostgresStore::connect(&PostgresConfig::default()).await?;
//! let mut session = store.read().await?;
//! let nodes = session.list_all_nodes().await?;
//! session.close().await?;
//! ```

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::{NoTls, Row};

use crate::config::PostgresConfig;
use crate::error::AppError;
use crate::models::{
    ActionItem, Incident, NewActionItem, NewIncident, NewNode, NewRisk, NewUser, Node, NodeId,
    Risk, RiskId, User,
};
use crate::store::{RecordReader, ReadSession, RiskStore, RiskWriter, ScopeReader, WriteSession};

const NODE_COLUMNS: &str = "id, name, parent_id, level";
const USER_COLUMNS: &str = "id, username, email, node_id, level, is_active";
const RISK_COLUMNS: &str = "id, title, description, node_id, risk_type, status, created_at";
const INCIDENT_COLUMNS: &str =
    "id, name, description, root_cause, loss_amount, is_financial, node_id, created_at";
const ACTION_COLUMNS: &str = "id, description, risk_id, assigned_to, status, due_date";

/// PostgreSQL store with connection pooling via deadpool-postgres.
///
/// This type is cheap to clone - the underlying connection pool is `Arc`-based.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Creates a pooled store. Connections are opened lazily.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, AppError> {
        let pg_config: tokio_postgres::Config =
            config.connection_string().parse().map_err(|e| {
                AppError::Internal(format!("Invalid PostgreSQL connection string: {}", e))
            })?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(config.max_connections)
            .build()
            .map_err(|e| AppError::Pool(format!("Failed to create connection pool: {}", e)))?;

        Ok(Self { pool })
    }

    async fn get_connection(&self) -> Result<Object, AppError> {
        self.pool
            .get()
            .await
            .map_err(|e| AppError::Pool(format!("Failed to get connection from pool: {}", e)))
    }

    /// Begins a transaction on a pooled connection.
    ///
    /// Read-only sessions use `REPEATABLE READ` so every query in the
    /// session sees the same snapshot.
    pub async fn begin(&self, read_only: bool) -> Result<PostgresSession, AppError> {
        let conn = self.get_connection().await?;
        let begin = if read_only {
            "BEGIN ISOLATION LEVEL REPEATABLE READ READ ONLY"
        } else {
            "BEGIN"
        };
        conn.batch_execute(begin)
            .await
            .map_err(|e| query_error(e, begin))?;

        Ok(PostgresSession {
            conn: Some(conn),
            read_only,
        })
    }
}

#[async_trait]
impl RiskStore for PostgresStore {
    async fn read(&self) -> Result<Box<dyn ReadSession>, AppError> {
        Ok(Box::new(self.begin(true).await?))
    }

    async fn write(&self) -> Result<Box<dyn WriteSession>, AppError> {
        Ok(Box::new(self.begin(false).await?))
    }

    async fn ping(&self) -> Result<(), AppError> {
        let conn = self.get_connection().await?;
        conn.simple_query("SELECT 1")
            .await
            .map_err(|e| query_error(e, "SELECT 1"))?;
        Ok(())
    }
}

/// A transaction on a pooled connection.
///
/// Must be finished with commit, rollback or close. A session dropped while
/// still open detaches its connection from the pool instead of returning it
/// mid-transaction.
pub struct PostgresSession {
    conn: Option<Object>,
    read_only: bool,
}

impl PostgresSession {
    fn conn(&self) -> Result<&Object, AppError> {
        self.conn
            .as_ref()
            .ok_or_else(|| AppError::Internal("session already finished".to_string()))
    }

    fn writable(&self) -> Result<&Object, AppError> {
        if self.read_only {
            return Err(AppError::ReadOnly);
        }
        self.conn()
    }

    async fn finish(&mut self, statement: &str) -> Result<(), AppError> {
        let conn = self.conn.take().ok_or_else(|| {
            AppError::Internal("session already finished".to_string())
        })?;
        conn.batch_execute(statement)
            .await
            .map_err(|e| query_error(e, statement))
    }

    /// Executes one or more SQL statements without results.
    pub async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
        self.conn()?
            .batch_execute(sql)
            .await
            .map_err(|e| query_error(e, sql))
    }

    /// Executes a single parameterized statement, returning the affected row count.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<u64, AppError> {
        self.writable()?
            .execute(sql, params)
            .await
            .map_err(|e| query_error(e, sql))
    }

    /// Runs a query expected to return exactly one row.
    pub async fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Row, AppError> {
        self.conn()?
            .query_one(sql, params)
            .await
            .map_err(|e| query_error(e, sql))
    }

    async fn fetch<T>(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
        map: fn(&Row) -> Result<T, AppError>,
    ) -> Result<Vec<T>, AppError> {
        let rows = self
            .conn()?
            .query(sql, params)
            .await
            .map_err(|e| query_error(e, sql))?;
        rows.iter().map(map).collect()
    }

    async fn fetch_opt<T>(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
        map: fn(&Row) -> Result<T, AppError>,
    ) -> Result<Option<T>, AppError> {
        let row = self
            .conn()?
            .query_opt(sql, params)
            .await
            .map_err(|e| query_error(e, sql))?;
        row.as_ref().map(map).transpose()
    }

    async fn insert<T>(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
        map: fn(&Row) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let row = self
            .writable()?
            .query_one(sql, params)
            .await
            .map_err(|e| query_error(e, sql))?;
        map(&row)
    }
}

impl Drop for PostgresSession {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!("PostgresSession dropped without commit, rollback or close");
            // Closing the connection aborts the open transaction server-side.
            drop(Object::take(conn));
        }
    }
}

#[async_trait]
impl ScopeReader for PostgresSession {
    async fn find_node(&self, id: NodeId) -> Result<Option<Node>, AppError> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = $1");
        self.fetch_opt(&sql, &[&id], row_to_node).await
    }

    async fn list_all_nodes(&self) -> Result<Vec<Node>, AppError> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes ORDER BY id");
        self.fetch(&sql, &[], row_to_node).await
    }

    async fn list_children(&self, parent_id: NodeId) -> Result<Vec<Node>, AppError> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE parent_id = $1 ORDER BY id");
        self.fetch(&sql, &[&parent_id], row_to_node).await
    }

    async fn list_risks_in(&self, node_ids: &[NodeId]) -> Result<Vec<Risk>, AppError> {
        let sql = format!("SELECT {RISK_COLUMNS} FROM risks WHERE node_id = ANY($1) ORDER BY id");
        self.fetch(&sql, &[&node_ids], row_to_risk).await
    }

    async fn list_incidents_in(&self, node_ids: &[NodeId]) -> Result<Vec<Incident>, AppError> {
        let sql = format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE node_id = ANY($1) ORDER BY id"
        );
        self.fetch(&sql, &[&node_ids], row_to_incident).await
    }

    async fn list_actions_for_risks(
        &self,
        risk_ids: &[RiskId],
    ) -> Result<Vec<ActionItem>, AppError> {
        let sql = format!(
            "SELECT {ACTION_COLUMNS} FROM action_items WHERE risk_id = ANY($1) ORDER BY id"
        );
        self.fetch(&sql, &[&risk_ids], row_to_action).await
    }
}

#[async_trait]
impl RecordReader for PostgresSession {
    async fn find_risk(&self, id: RiskId) -> Result<Option<Risk>, AppError> {
        let sql = format!("SELECT {RISK_COLUMNS} FROM risks WHERE id = $1");
        self.fetch_opt(&sql, &[&id], row_to_risk).await
    }

    async fn find_incident(&self, id: i64) -> Result<Option<Incident>, AppError> {
        let sql = format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = $1");
        self.fetch_opt(&sql, &[&id], row_to_incident).await
    }

    async fn find_action_item(&self, id: i64) -> Result<Option<ActionItem>, AppError> {
        let sql = format!("SELECT {ACTION_COLUMNS} FROM action_items WHERE id = $1");
        self.fetch_opt(&sql, &[&id], row_to_action).await
    }
}

#[async_trait]
impl RiskWriter for PostgresSession {
    async fn reset(&mut self) -> Result<(), AppError> {
        let sql = "TRUNCATE action_items, incidents, risks, users, nodes RESTART IDENTITY CASCADE";
        self.writable()?
            .batch_execute(sql)
            .await
            .map_err(|e| query_error(e, sql))
    }

    async fn create_node(&mut self, node: NewNode) -> Result<Node, AppError> {
        let sql = format!(
            "INSERT INTO nodes (name, parent_id, level) VALUES ($1, $2, $3) RETURNING {NODE_COLUMNS}"
        );
        self.insert(&sql, &[&node.name, &node.parent_id, &node.level], row_to_node)
            .await
    }

    async fn create_user(&mut self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (username, email, node_id, level, is_active)
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        self.insert(
            &sql,
            &[
                &user.username,
                &user.email,
                &user.node_id,
                &user.level,
                &user.is_active,
            ],
            row_to_user,
        )
        .await
    }

    async fn create_risk(&mut self, risk: NewRisk) -> Result<Risk, AppError> {
        let sql = format!(
            "INSERT INTO risks (title, description, node_id, risk_type, status)
             VALUES ($1, $2, $3, $4, $5) RETURNING {RISK_COLUMNS}"
        );
        self.insert(
            &sql,
            &[
                &risk.title,
                &risk.description,
                &risk.node_id,
                &risk.risk_type,
                &risk.status,
            ],
            row_to_risk,
        )
        .await
    }

    async fn create_incident(&mut self, incident: NewIncident) -> Result<Incident, AppError> {
        let sql = format!(
            "INSERT INTO incidents (name, description, root_cause, loss_amount, is_financial, node_id)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {INCIDENT_COLUMNS}"
        );
        self.insert(
            &sql,
            &[
                &incident.name,
                &incident.description,
                &incident.root_cause,
                &incident.loss_amount,
                &incident.is_financial,
                &incident.node_id,
            ],
            row_to_incident,
        )
        .await
    }

    async fn create_action_item(&mut self, item: NewActionItem) -> Result<ActionItem, AppError> {
        let sql = format!(
            "INSERT INTO action_items (description, risk_id, assigned_to, status, due_date)
             VALUES ($1, $2, $3, $4, $5) RETURNING {ACTION_COLUMNS}"
        );
        self.insert(
            &sql,
            &[
                &item.description,
                &item.risk_id,
                &item.assigned_to,
                &item.status,
                &item.due_date,
            ],
            row_to_action,
        )
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        self.fetch_opt(&sql, &[&username], row_to_user).await
    }

    async fn list_users_at(&self, node_id: NodeId) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE node_id = $1 ORDER BY id");
        self.fetch(&sql, &[&node_id], row_to_user).await
    }
}

#[async_trait]
impl ReadSession for PostgresSession {
    async fn close(&mut self) -> Result<(), AppError> {
        self.finish("COMMIT").await
    }
}

#[async_trait]
impl WriteSession for PostgresSession {
    async fn commit(&mut self) -> Result<(), AppError> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        self.finish("ROLLBACK").await
    }
}

// ----------------------------------------------------------------------------
// Row mapping
// ----------------------------------------------------------------------------

/// Converts a driver error, keeping PostgreSQL's diagnostic detail.
fn query_error(e: tokio_postgres::Error, query: &str) -> AppError {
    let message = e
        .as_db_error()
        .map(|db_err| {
            format!(
                "{}: {} ({})",
                db_err.severity(),
                db_err.message(),
                db_err.code().code()
            )
        })
        .unwrap_or_else(|| e.to_string());
    AppError::Query {
        message,
        query: query.to_string(),
    }
}

fn column<'a, T>(row: &'a Row, name: &str) -> Result<T, AppError>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name)
        .map_err(|e| AppError::Internal(format!("failed to decode column '{}': {}", name, e)))
}

fn row_to_node(row: &Row) -> Result<Node, AppError> {
    Ok(Node {
        id: column(row, "id")?,
        name: column(row, "name")?,
        parent_id: column(row, "parent_id")?,
        level: column(row, "level")?,
    })
}

fn row_to_user(row: &Row) -> Result<User, AppError> {
    Ok(User {
        id: column(row, "id")?,
        username: column(row, "username")?,
        email: column(row, "email")?,
        node_id: column(row, "node_id")?,
        level: column(row, "level")?,
        is_active: column(row, "is_active")?,
    })
}

fn row_to_risk(row: &Row) -> Result<Risk, AppError> {
    Ok(Risk {
        id: column(row, "id")?,
        title: column(row, "title")?,
        description: column(row, "description")?,
        node_id: column(row, "node_id")?,
        risk_type: column(row, "risk_type")?,
        status: column(row, "status")?,
        created_at: column(row, "created_at")?,
    })
}

fn row_to_incident(row: &Row) -> Result<Incident, AppError> {
    Ok(Incident {
        id: column(row, "id")?,
        name: column(row, "name")?,
        description: column(row, "description")?,
        root_cause: column(row, "root_cause")?,
        loss_amount: column(row, "loss_amount")?,
        is_financial: column(row, "is_financial")?,
        node_id: column(row, "node_id")?,
        created_at: column(row, "created_at")?,
    })
}

fn row_to_action(row: &Row) -> Result<ActionItem, AppError> {
    Ok(ActionItem {
        id: column(row, "id")?,
        description: column(row, "description")?,
        risk_id: column(row, "risk_id")?,
        assigned_to: column(row, "assigned_to")?,
        status: column(row, "status")?,
        due_date: column(row, "due_date")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_lists_match_row_mappers() {
        // Every column a mapper reads must be selected.
        for (columns, expected) in [
            (NODE_COLUMNS, vec!["id", "name", "parent_id", "level"]),
            (
                ACTION_COLUMNS,
                vec!["id", "description", "risk_id", "assigned_to", "status", "due_date"],
            ),
        ] {
            let selected: Vec<&str> = columns.split(", ").collect();
            assert_eq!(selected, expected);
        }
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_connection_string() {
        let config = PostgresConfig {
            uri: "postgresql://user@host:notaport/db".to_string(),
            max_connections: 1,
        };
        let err = PostgresStore::connect(&config).await.err().unwrap();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
