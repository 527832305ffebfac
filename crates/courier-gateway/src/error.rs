// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`CourierError`] to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use courier_core::CourierError;
use serde::Serialize;
use tracing::{error, warn};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    /// Assistant text produced before a run gave up, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<String>,
}

/// Wrapper so handlers can return `Result<_, ApiError>` and use `?`.
#[derive(Debug)]
pub struct ApiError(pub CourierError);

impl From<CourierError> for ApiError {
    fn from(e: CourierError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(CourierError::InvalidInput(message.into()))
    }
}

pub fn status_for(error: &CourierError) -> StatusCode {
    match error {
        CourierError::NotFound { .. } => StatusCode::NOT_FOUND,
        CourierError::LockTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        CourierError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CourierError::ToolLoopExceeded { .. }
        | CourierError::Protocol(_)
        | CourierError::Unavailable { .. }
        | CourierError::Collaborator { .. }
        | CourierError::Channel { .. } => StatusCode::BAD_GATEWAY,
        CourierError::Config(_) | CourierError::Storage { .. } | CourierError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "admin request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "admin request rejected");
        }

        let partial = match &self.0 {
            CourierError::ToolLoopExceeded { partial, .. } => partial.clone(),
            _ => None,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                partial,
            }),
        )
            .into_response()
    }
}
