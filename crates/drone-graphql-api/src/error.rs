//! # API Error Types
//!
//! Unified error handling for the GraphQL API layer.

use async_graphql::{Error as GraphQLError, ErrorExtensions};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use drone_dispatch::DispatchError;

/// API-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Infeasible: {0}")]
    Infeasible(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::Infeasible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for GraphQL extensions
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Infeasible(_) => "INFEASIBLE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Malformed identifier argument
    pub fn invalid_id(entity_type: &str, raw: &str) -> Self {
        Self::InvalidInput(format!("'{raw}' is not a valid {entity_type} id"))
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            DispatchError::InvalidState(msg) => Self::InvalidState(msg),
            DispatchError::Infeasible(msg) => Self::Infeasible(msg),
            DispatchError::Validation(msg) => Self::InvalidInput(msg),
            DispatchError::Store(msg) => {
                tracing::error!(error = %msg, "entity store fault");
                Self::Internal(msg)
            }
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> GraphQLError {
        GraphQLError::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.error_code());
            e.set("status", self.status_code().as_u16());

            if let Self::NotFound { entity_type, id } = self {
                e.set("entity_type", entity_type.as_str());
                e.set("entity_id", id.as_str());
            }
        })
    }
}

/// Convert into a GraphQL error carrying code and status extensions.
///
/// `?` alone would go through async-graphql's blanket `Display` conversion
/// and drop the extensions.
pub fn graphql_error<E: Into<ApiError>>(err: E) -> GraphQLError {
    err.into().extend()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "code": self.error_code(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_errors_map_to_codes() {
        let cases = [
            (DispatchError::not_found("Order", 4), "NOT_FOUND"),
            (DispatchError::invalid_state("busy"), "INVALID_STATE"),
            (DispatchError::infeasible("no eligible drone"), "INFEASIBLE"),
            (DispatchError::Validation("weight".into()), "INVALID_INPUT"),
            (DispatchError::Store("corrupt".into()), "INTERNAL_ERROR"),
        ];
        for (err, code) in cases {
            assert_eq!(ApiError::from(err).error_code(), code);
        }
    }

    #[test]
    fn test_http_response_uses_status_code() {
        let response = ApiError::Infeasible("queue is empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_extensions_carry_code_and_status() {
        let err = ApiError::from(DispatchError::not_found("Drone", 9)).extend();
        let ext = err.extensions.expect("extensions set");
        assert_eq!(ext.get("code"), Some(&async_graphql::Value::String("NOT_FOUND".to_string())));
        assert_eq!(ext.get("entity_id"), Some(&async_graphql::Value::String("9".to_string())));
    }
}
