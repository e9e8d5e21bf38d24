//! Storage collaborator for the risk hierarchy.
//!
//! The insight core only reads through [`ScopeReader`]; record lookups go
//! through [`RecordReader`]; the API, seeding and tests write through
//! [`RiskWriter`]. A [`RiskStore`] hands out sessions:
//!
//! - [`RiskStore::read`] opens one consistent snapshot for a whole request
//! - [`RiskStore::write`] opens a transaction that must be committed
//!
//! # Usage
//!
//! ```ignore
//! let mut session = store.read().await?;
//! let nodes = session.list_all_nodes().await?;
//! session.close().await?;
//! ```
//!
//! # Available Backends
//!
//! | Backend | Module |
//! |---------|--------|
//! | In-memory copy-on-write | [`backends::memory`] |
//! | PostgreSQL | [`backends::postgres`] |

mod traits;

pub mod backends;

pub use traits::{RecordReader, ReadSession, RiskStore, RiskWriter, ScopeReader, WriteSession};

use crate::error::AppError;

/// Closes a read session after `work` finished with it.
///
/// The work result takes precedence over a failure to close.
pub async fn close_after<T>(
    mut session: Box<dyn ReadSession>,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    let closed = session.close().await;
    let value = result?;
    closed?;
    Ok(value)
}

/// Commits a write session when `result` succeeded, rolls it back otherwise.
pub async fn commit_after<T>(
    mut session: Box<dyn WriteSession>,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = session.rollback().await {
                tracing::warn!(error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}
