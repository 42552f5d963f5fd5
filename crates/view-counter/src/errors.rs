use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub enum ViewCounterError {
    InvalidSlug,
    RecordFailed,
}

impl IntoResponse for ViewCounterError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ViewCounterError::InvalidSlug => (StatusCode::BAD_REQUEST, "Invalid slug"),
            ViewCounterError::RecordFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to record view")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
