// ABOUTME: Shared API response envelope and pipeline-to-HTTP error mapping
// ABOUTME: Every endpoint answers in the same {success, data, error} shape

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use serde::Serialize;

use promptforge_pipeline::PipelineError;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

/// Structured error payload: stable kind plus a retry hint.
#[derive(Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    pub retry_recommended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// The API-layer error. Wraps pipeline errors and adds the cases that only
/// exist at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Pipeline(error) => match error {
                PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
                PipelineError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                PipelineError::Parse(_) => StatusCode::BAD_GATEWAY,
                PipelineError::Provider(_) => StatusCode::BAD_GATEWAY,
                PipelineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                PipelineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            },
            AppError::JobNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> ErrorBody {
        let (kind, retry_recommended, retry_after_secs) = match self {
            AppError::Pipeline(error) => {
                let retry_after = match error {
                    PipelineError::RateLimited { retry_after_secs } => *retry_after_secs,
                    _ => None,
                };
                (error.kind(), error.retry_recommended(), retry_after)
            }
            AppError::JobNotFound(_) => ("not_found", false, None),
            AppError::BadRequest(_) => ("bad_request", false, None),
        };
        ErrorBody {
            kind: kind.to_string(),
            message: self.to_string(),
            retry_recommended,
            retry_after_secs,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let response = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.body()),
        };
        (self.status(), ResponseJson(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_maps_to_429_with_retry_hint() {
        let error = AppError::Pipeline(PipelineError::RateLimited {
            retry_after_secs: Some(30),
        });
        assert_eq!(error.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = error.body();
        assert_eq!(body.kind, "rate_limit_denied");
        assert!(body.retry_recommended);
        assert_eq!(body.retry_after_secs, Some(30));
    }

    #[test]
    fn validation_maps_to_400_without_retry() {
        let error = AppError::Pipeline(PipelineError::Validation(
            promptforge_core::ValidationError::TooShort(3),
        ));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        let body = error.body();
        assert_eq!(body.kind, "validation_error");
        assert!(!body.retry_recommended);
    }

    #[test]
    fn unknown_job_maps_to_404() {
        let error = AppError::JobNotFound("abc".to_string());
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.body().kind, "not_found");
    }
}
