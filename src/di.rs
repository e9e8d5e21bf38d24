//! Dependency injection infrastructure.
//!
//! Services declare their dependencies as fields and derive `FromContext`;
//! the root [`Context`](crate::context::Context) derives `Context` so each of
//! its fields can be extracted with `FromRef`.
//!
//! ```ignore
//! #[derive(FromContext, Clone)]
//! pub struct DashboardService {
//!     store: AppStore,
//!     config: Arc<Config>,
//! }
//!
//! let dashboard = DashboardService::from_ref(&ctx);
//! ```

/// Trait for extracting a value from a reference to another type.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Any Clone type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

// Re-export derive macros
pub use di_macros::{Context, FromContext};
