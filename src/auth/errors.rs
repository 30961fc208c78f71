//! Authentication Error Taxonomy
//! Mission: Map every failure to one stable status + message pair

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Auth errors surfaced to clients.
///
/// Malformed, expired, badly signed, and already-consumed tokens all collapse
/// into `InvalidToken` so callers cannot probe which check failed. Internal
/// causes (hashing, signing, persistence) are logged where they occur and
/// reach the client only as `Internal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    EmailAlreadyExists,
    UserNotFound,
    MissingToken,
    InvalidToken,
    Forbidden,
    BadRequest(&'static str),
    Internal,
}

impl AuthError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            AuthError::EmailAlreadyExists => (StatusCode::CONFLICT, "Email already in use"),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Authentication token not provided",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Access denied: insufficient permissions",
            ),
            AuthError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AuthError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.status_and_message().1)
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}
