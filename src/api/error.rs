//! HTTP rendering of [`AppError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::AppError;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Machine-readable error kind (see [`AppError::kind`]).
    pub kind: String,
    /// Human-readable description.
    pub message: String,
}

/// HTTP status for an error.
#[must_use]
pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        AppError::SourceUnavailable(_) | AppError::Summarizer(_) | AppError::Notification(_) => {
            StatusCode::BAD_GATEWAY
        }
        AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Db(_) | AppError::Render(_) | AppError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(kind = self.kind(), err = %self, "request failed");
        }
        let body = ErrorBody {
            kind: self.kind().to_owned(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
