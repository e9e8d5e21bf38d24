//! Backend implementations of the storage traits.
//!
//! Each backend implements [`RiskStore`](crate::store::RiskStore) and a
//! session type implementing both session traits.

pub mod memory;
pub mod postgres;
