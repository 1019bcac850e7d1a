use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::debug;

use shower_core::ValidationError;
use shower_live::{StoreError, SubmitError};
use shower_types::api::ErrorBody;

/// What a handler can fail with. Backend details stay in the log; the
/// client only learns whether retrying makes sense.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("request body must be a JSON object with the expected fields")]
    Malformed,

    #[error("guessing is closed")]
    Closed,

    #[error("something went wrong on our side, please try again")]
    Unavailable,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        Self::Malformed
    }
}

impl From<SubmitError> for ApiError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Validation(v) => Self::Validation(v),
            SubmitError::Closed => Self::Closed,
            SubmitError::Transient(_) => Self::Unavailable,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(v) => Self::Validation(v),
            StoreError::Transient(_) => Self::Unavailable,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Malformed => StatusCode::BAD_REQUEST,
            Self::Closed => StatusCode::CONFLICT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            retryable: matches!(self, Self::Unavailable),
        };
        (self.status(), Json(body)).into_response()
    }
}
