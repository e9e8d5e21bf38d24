//! User model; users are assigned action items.

use serde::{Deserialize, Serialize};

use super::{NodeId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Node the user belongs to.
    pub node_id: NodeId,
    pub level: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub node_id: NodeId,
    pub level: i32,
    pub is_active: bool,
}
