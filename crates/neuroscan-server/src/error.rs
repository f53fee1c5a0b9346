//! API error type and its HTTP mapping.
//!
//! Every internal failure is classified into one of these kinds at the
//! component boundary; responses carry a stable error code and a
//! plain-language message, never internal detail.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use neuroscan_ai::AiError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No model available. Configure a classifier model path.")]
    ModelUnavailable,

    #[error("Prediction failed: {0}")]
    Inference(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Explain called without a session cookie.
    #[error("no session")]
    NoSession,

    /// Session introspection for an absent cookie.
    #[error("no session")]
    SessionNotFound,

    #[error("No prior prediction found for this session. Please upload a brain MRI image first.")]
    NoPrediction,

    #[error("Invalid image - comprehensive explanation only available for valid brain MRI images.")]
    InvalidImage,

    #[error(
        "Invalid prediction type - comprehensive explanation only available for brain tumor \
         classifications."
    )]
    InvalidPrediction,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("No batch predictions file found under outputs/batch/")]
    NoBatchPredictions,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::ModelUnavailable => Self::ModelUnavailable,
            AiError::InferenceFailed(msg) => Self::Inference(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::ModelUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "no_model"),
            ApiError::Inference(_) => (StatusCode::INTERNAL_SERVER_ERROR, "inference_failed"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NoSession => (StatusCode::BAD_REQUEST, "no_session"),
            ApiError::SessionNotFound => (StatusCode::NOT_FOUND, "no_session"),
            ApiError::NoPrediction => (StatusCode::BAD_REQUEST, "no_prediction"),
            ApiError::InvalidImage => (StatusCode::BAD_REQUEST, "invalid_image"),
            ApiError::InvalidPrediction => (StatusCode::BAD_REQUEST, "invalid_prediction"),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            ApiError::NoBatchPredictions => (StatusCode::NOT_FOUND, "no_batch_predictions"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
