//! risk-insights - hierarchical risk aggregation with generated insights.
//!
//! Resolves a node of an organizational hierarchy to its subtree,
//! aggregates the risks, incidents and action items recorded there, and
//! asks a configurable text-generation provider to summarize them.

pub mod api;
pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod migrations;
pub mod models;
pub mod provider;
pub mod services;
pub mod store;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;
