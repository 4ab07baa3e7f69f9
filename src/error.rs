use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure taxonomy for every circulation operation. Expected validation
/// outcomes are values here, not panics; only `Persistence`/`Internal`
/// represent an unhealthy backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more required fields were missing or malformed. Collected as a
    /// list so the caller sees everything wrong with the request at once.
    #[error("validation failed")]
    Validation(Vec<String>),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Conflict(String),
    #[error("book {0} is not available")]
    BookNotAvailable(i64),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("this account is disabled")]
    AccountDisabled,
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error("admin role required")]
    Forbidden,
    #[error(transparent)]
    Persistence(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, messages) = match &self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, errors.clone()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, vec![self.to_string()]),
            ApiError::Duplicate(_) | ApiError::Conflict(_) | ApiError::BookNotAvailable(_) => {
                (StatusCode::CONFLICT, vec![self.to_string()])
            }
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, vec![self.to_string()]),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, vec![self.to_string()]),
            ApiError::AccountDisabled | ApiError::Forbidden => {
                (StatusCode::FORBIDDEN, vec![self.to_string()])
            }
            ApiError::Persistence(e) => {
                error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, vec!["storage failure".into()])
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, vec!["internal error".into()])
            }
        };
        (status, Json(json!({ "ok": false, "errors": messages }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let resp = ApiError::Validation(vec!["select a member".into()]).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn book_not_available_maps_to_conflict() {
        let resp = ApiError::BookNotAvailable(7).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn disabled_account_maps_to_forbidden() {
        let resp = ApiError::AccountDisabled.into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
