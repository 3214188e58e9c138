//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use civicport_core::Error;

/// Wrapper so core errors can flow out of handlers with `?`.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::AuthFailed { .. } => StatusCode::UNAUTHORIZED,
        Error::Forbidden { .. } => StatusCode::FORBIDDEN,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        Error::Backend { .. } | Error::Notify { .. } => StatusCode::BAD_GATEWAY,
        Error::ConfigError(_) | Error::IoError(_) | Error::JsonError(_) | Error::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(status_for(&Error::auth_failed("x")), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(&Error::forbidden("citizen", "x")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_for(&Error::not_found("issue", "1")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&Error::invalid_input("x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&Error::backend(500, "x")), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&Error::timeout("profile lookup")),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
