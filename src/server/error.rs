//! HTTP error boundary.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::warn;

use crate::resolver::ResolveError;
use crate::stream::StreamError;

/// Error body: `{"detail": "...", "code": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    code: &'static str,
}

/// A failure reported to the client.
///
/// Resolver and streamer failures are all client-facing 400s; the `code`
/// distinguishes them.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
    code: &'static str,
}

impl ApiError {
    /// A 400 with an explicit code.
    #[must_use]
    pub fn bad_request(code: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
            code,
        }
    }

    /// A 500 for failures on this side of the boundary.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
            code: "internal_error",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<ResolveError> for ApiError {
    fn from(error: ResolveError) -> Self {
        Self::bad_request(error.code(), error.to_string())
    }
}

impl From<StreamError> for ApiError {
    fn from(error: StreamError) -> Self {
        Self::bad_request(error.code(), error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = self.status.as_u16(), code = self.code, detail = %self.detail, "Request failed");
        let body = Json(ErrorBody {
            detail: self.detail,
            code: self.code,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_error_maps_to_400_with_code() {
        let error = ApiError::from(ResolveError::upstream("https://player.vimeo.com/x", 403));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "upstream_fetch_error");
        assert!(json["detail"].as_str().unwrap().contains("403"));
    }

    #[test]
    fn test_stream_error_keeps_code() {
        let error = ApiError::from(StreamError::invalid_format("x", "https://youtu.be/a"));
        assert_eq!(error.code(), "invalid_format_selected");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }
}
