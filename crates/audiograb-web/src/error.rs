use std::time::Duration;

use audiograb_core::{FetchFailure, ValidationError};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Terminal request outcomes, one status code per taxonomy entry so callers
/// can tell "retry later" from "fix your request" from "we ran out of
/// strategies". Every variant renders structured JSON, never an HTML page.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing 'videoId' parameter")]
    MissingVideoId,

    #[error("{0}")]
    InvalidVideoId(ValidationError),

    #[error("Server is at capacity. Please try again later.")]
    AtCapacity { retry_after: Duration },

    #[error("{}", .0.consolidated_message())]
    AllSourcesFailed(FetchFailure),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::MissingVideoId | Self::InvalidVideoId(_) => {
                (StatusCode::BAD_REQUEST, Json(failure_body(&self))).into_response()
            }
            Self::AtCapacity { retry_after } => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, retry_after.as_secs().to_string())],
                Json(failure_body(&self)),
            )
                .into_response(),
            Self::AllSourcesFailed(_) => {
                let body = serde_json::json!({
                    "success": false,
                    "message": self.to_string(),
                    "timestamp": rfc3339_now(),
                    "errorType": "AllSourcesFailed",
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

fn failure_body(error: &ApiError) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "message": error.to_string(),
    })
}

fn rfc3339_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
