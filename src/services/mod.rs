//! Business logic services for the risk hierarchy.
//!
//! Services hold their dependencies as fields and derive `FromContext`,
//! so any of them can be resolved from the application context.

pub mod aggregate;
pub mod composer;
mod dashboard;
mod health;
mod insight;
mod records;
pub mod scope;
mod seed;

pub use aggregate::aggregate;
pub use composer::compose_insight;
pub use dashboard::DashboardService;
pub use health::{Health, HealthService};
pub use insight::InsightService;
pub use records::RecordService;
pub use scope::{resolve_scope, ScopeService};
pub use seed::{SeedOptions, SeedReport, SeedService};
