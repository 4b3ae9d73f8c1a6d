use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// Keep in sync with parley_shared::constants::EMPTY_SUBMISSION_ERROR.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No input provided. Please submit text or images.")]
    EmptySubmission,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Error resizing image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // The original backend funnels every handler exception into a single
        // 500; only malformed submissions get a 400.
        let status = match &self {
            GatewayError::EmptySubmission | GatewayError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Image(_) | GatewayError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
