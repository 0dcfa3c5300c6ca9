//! API error type and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use archivist_core::Error;

/// Route-level error, mapped onto HTTP status codes.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::DocumentNotFound(hash) => {
                ApiError::NotFound(format!("Document not found: {}", hash))
            }
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unavailable(msg) => ApiError::Unavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_not_found_maps_to_404() {
        let err: ApiError = Error::DocumentNotFound("blake3:aa".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let err: ApiError = Error::InvalidInput("bad limit".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_unavailable_maps_to_503() {
        let err: ApiError = Error::Unavailable("index down".to_string()).into();
        assert!(matches!(err, ApiError::Unavailable(_)));
    }

    #[test]
    fn test_other_errors_map_to_500() {
        let err: ApiError = Error::Internal("bug".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
        let err: ApiError = Error::Index("bad body".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
