//! HTTP error responses
//!
//! Every failure is answered with `{"error": message}`. Input problems are
//! 400; pipeline failures are 500 whatever the stage.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pipeline::GatewayError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Status plus message, rendered as `ErrorResponse`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::EmptyQuestion => {
                ApiError::bad_request("userQuery is required and must be a string")
            }
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidationError;

    #[test]
    fn test_pipeline_failures_are_500() {
        let err: ApiError = GatewayError::Validation(ValidationError::forbidden("$where")).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.message,
            "Unsafe query detected. Contains forbidden keyword: $where"
        );
    }

    #[test]
    fn test_empty_question_is_400() {
        let err: ApiError = GatewayError::EmptyQuestion.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
