//! Application error types with HTTP status conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::models::NodeId;

/// Application-level errors for risk-insights.
#[derive(Error, Debug)]
pub enum AppError {
    // Domain errors
    #[error("Scope not found: node {0}")]
    ScopeNotFound(NodeId),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    // Provider errors
    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),

    // Storage errors
    #[error("Database query error: {message}")]
    Query { message: String, query: String },

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Write attempted on a read-only session")]
    ReadOnly,

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures while calling a configured text-generation provider.
///
/// An unconfigured provider is not an error; it answers with sentinel text.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("invalid {provider} response: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },
}

impl AppError {
    /// Status code and stable machine-readable code for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ScopeNotFound(_) => (StatusCode::NOT_FOUND, "SCOPE_NOT_FOUND"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
            AppError::Query { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "QUERY_ERROR"),
            AppError::Pool(_) => (StatusCode::SERVICE_UNAVAILABLE, "POOL_ERROR"),
            AppError::ReadOnly => (StatusCode::INTERNAL_SERVER_ERROR, "READ_ONLY"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "Request failed");
        }

        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
