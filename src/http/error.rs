//! Error → HTTP response translation. The only place status codes are chosen.

use crate::error::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg.clone()),
            Error::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "AI task service is not configured".to_string(),
            ),
            Error::Unreachable(e) => {
                error!(error = %e, "task broker error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "broker_unreachable",
                    "task broker is unreachable".to_string(),
                )
            }
            Error::TaskNotFound(id) => (
                StatusCode::NOT_FOUND,
                "task_not_found",
                format!("task {id} not found"),
            ),
            Error::RouteNotFound(path) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("no route for {path}"),
            ),
            Error::MethodNotAllowed { method, path } => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                format!("method {method} not allowed on {path}"),
            ),
            other => {
                error!(error = %other, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        if status.is_client_error() {
            warn!(status = status.as_u16(), %message, "request rejected");
        }

        (
            status,
            Json(ErrorBody {
                error: code,
                message,
            }),
        )
            .into_response()
    }
}
