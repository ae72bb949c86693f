//! HTTP-facing error type and its JSON body.

use apples_core::StoreError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every error response: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors returned by the apple handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// `PUT` body names a different apple than the path.
    #[error("Cannot change name using PUT")]
    NameMismatch,
    /// Request body was not a JSON object.
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
    #[error("Not found")]
    RouteNotFound,
}

impl ApiError {
    /// Status code for this error: missing apples are 404, name collisions
    /// and malformed requests are 400.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound { .. }) | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) | Self::NameMismatch => StatusCode::BAD_REQUEST,
            Self::Body(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            tracing::debug!(%status, error = %self, "request rejected");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
