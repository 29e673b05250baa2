//! JSON error responses

use crate::api::ServiceError;
use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Error body returned by every route: `{"error": ..., "details": ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid request").with_details(details)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").with_details(details)
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Query(e) => ApiError::bad_request(e.to_string()),
            ServiceError::ComplexNotFound(key) => {
                ApiError::not_found("Complex not found").with_details(key)
            }
            ServiceError::Structure(e) if e.is_not_found() => {
                ApiError::not_found("Structure not found").with_details(e.to_string())
            }
            ServiceError::Structure(e) => {
                ApiError::internal(e.to_string()).with_error("Failed to load structure")
            }
            ServiceError::Storage(e) => {
                let details = match &e {
                    StorageError::Database(_) => "database query failed".to_string(),
                    other => other.to_string(),
                };
                error!(error = %e, "storage failure");
                ApiError::internal(details).with_error("Database error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(&self)).into_response()
    }
}
