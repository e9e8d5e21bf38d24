//! Compile-time dependency injection macros for risk-insights.
//!
//! Two derives cooperate with a `FromRef` trait that the consuming crate
//! defines at its root (generated code refers to `crate::FromRef`):
//!
//! - `#[derive(Context)]` exposes every field of the root context
//! - `#[derive(FromContext)]` builds a service by resolving each field

use proc_macro::TokenStream;

mod context;
mod fields;
mod from_context;

/// Makes every field of a context struct extractable through `FromRef`.
///
/// Fields must be `Clone`; extraction clones the field.
///
/// ```ignore
/// #[derive(Context, Clone)]
/// pub struct Context {
///     pub store: AppStore,
///     pub generator: AppGenerator,
/// }
///
/// // impl FromRef<Context> for AppStore { ... }
/// // impl FromRef<Context> for AppGenerator { ... }
/// ```
#[proc_macro_derive(Context)]
pub fn derive_context(input: TokenStream) -> TokenStream {
    context::derive_context_impl(input)
}

/// Generates `FromRef<Context>` for a struct whose fields are all resolvable
/// from the context.
///
/// ```ignore
/// #[derive(FromContext, Clone)]
/// pub struct InsightService {
///     store: AppStore,          // AppStore::from_ref(ctx)
///     generator: AppGenerator,  // AppGenerator::from_ref(ctx)
/// }
/// ```
///
/// The context type defaults to `Context`; override it with
/// `#[from_context(Context = "path::To::Ctx")]`.
#[proc_macro_derive(FromContext, attributes(from_context))]
pub fn derive_from_context(input: TokenStream) -> TokenStream {
    from_context::derive_from_context_impl(input)
}
