//! Mapping of core errors onto HTTP responses.
//!
//! `medibook-core` knows nothing about HTTP; this wrapper gives each taxonomy
//! variant its status code and a structured `{"error": ...}` body. Internal
//! detail (database messages, hash failures) is logged and replaced with a
//! generic message before it reaches the wire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use medibook_core::ApiError;
use serde_json::json;

pub struct ApiFailure(pub ApiError);

pub type RestResult<T> = std::result::Result<T, ApiFailure>;

impl From<ApiError> for ApiFailure {
    fn from(err: ApiError) -> Self {
        ApiFailure(err)
    }
}

impl ApiFailure {
    fn status(&self) -> StatusCode {
        match self.0 {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Permission(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {:?}", self.0);
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_categories() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Authentication("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Permission("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ApiError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiFailure(err).status(), expected);
        }
    }
}
