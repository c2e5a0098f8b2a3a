use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Success envelope: `{"status":"success","data":...}` with a `results` count
/// on list payloads.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            results: None,
            data,
        }
    }

    /// Envelope for list payloads; `results` is the number of items returned.
    pub fn list(data: T, results: usize) -> Self {
        Self {
            status: "success",
            results: Some(results),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
