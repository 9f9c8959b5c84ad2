//! API error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use eventide_server_application::WorkflowServiceError;
use eventide_server_domain::RepositoryError;

/// Error surface of the administrative API.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<WorkflowServiceError> for ApiError {
    fn from(err: WorkflowServiceError) -> Self {
        match err {
            WorkflowServiceError::Validation(message) => {
                Self::new(StatusCode::BAD_REQUEST, message)
            }
            WorkflowServiceError::Repository(RepositoryError::NotFound(id)) => {
                Self::new(StatusCode::NOT_FOUND, format!("Workflow not found: {id}"))
            }
            WorkflowServiceError::Repository(conflict @ RepositoryError::Conflict { .. }) => {
                Self::new(StatusCode::CONFLICT, conflict.to_string())
            }
            WorkflowServiceError::Repository(backend) => {
                error!(error = %backend, "Repository error in API handler");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
