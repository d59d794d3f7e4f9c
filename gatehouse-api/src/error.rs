/// Error handling for the HTTP boundary
///
/// Operations below the handlers return typed `Result`s; this module is
/// the single place where those results become HTTP outcomes. The mapping
/// follows the service's redirect-as-control-flow convention:
///
/// - token failures on gated routes → `401 Unauthorized`
/// - every other failure → `302 Found` to the generic `/error` page
///
/// No structured error codes reach the client; the `tracing` log is the
/// only diagnostic trail. There are no retries anywhere.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatehouse_shared::auth::{middleware::redirect_found, password::PasswordError, token::TokenError};
use gatehouse_shared::models::account::AccountError;
use std::fmt;

/// Handler result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified handler error type
#[derive(Debug)]
pub enum ApiError {
    /// An account with this email already exists
    DuplicateEmail(String),

    /// Unknown email or wrong password
    InvalidCredentials,

    /// The submitted form failed validation
    Validation(Vec<FieldError>),

    /// Identity token missing or failed verification (401)
    InvalidToken(String),

    /// Database unreachable or operation failure
    Storage(String),

    /// Anything else that should never reach the client
    Internal(String),
}

/// A single failed form field
#[derive(Debug, Clone)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Why it failed
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::DuplicateEmail(email) => write!(f, "duplicate email: {email}"),
            ApiError::InvalidCredentials => write!(f, "invalid credentials"),
            ApiError::Validation(errors) => write!(f, "validation failed: {} errors", errors.len()),
            ApiError::InvalidToken(reason) => write!(f, "invalid token: {reason}"),
            ApiError::Storage(reason) => write!(f, "storage error: {reason}"),
            ApiError::Internal(reason) => write!(f, "internal error: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::DuplicateEmail(email) => {
                tracing::warn!(%email, "registration rejected: email already taken");
                redirect_found("/error")
            }
            ApiError::InvalidCredentials => {
                tracing::warn!("login rejected: invalid credentials");
                redirect_found("/error")
            }
            ApiError::Validation(errors) => {
                for FieldError { field, message } in &errors {
                    tracing::warn!(%field, %message, "form validation failed");
                }
                redirect_found("/error")
            }
            ApiError::InvalidToken(reason) => {
                tracing::debug!(%reason, "rejected identity token");
                (StatusCode::UNAUTHORIZED, "Unauthorized: invalid token").into_response()
            }
            ApiError::Storage(reason) => {
                tracing::error!(%reason, "storage failure");
                redirect_found("/error")
            }
            ApiError::Internal(reason) => {
                tracing::error!(%reason, "internal error");
                redirect_found("/error")
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Password(e) => ApiError::Internal(e.to_string()),
            AccountError::Database(e) => ApiError::Storage(e.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Store(e) => ApiError::Storage(e.to_string()),
            TokenError::Sign(e) => ApiError::Internal(e),
            TokenError::Expired => ApiError::InvalidToken("token has expired".to_string()),
            TokenError::Invalid(e) => ApiError::InvalidToken(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_error_display() {
        let err = ApiError::DuplicateEmail("a@x.com".to_string());
        assert_eq!(err.to_string(), "duplicate email: a@x.com");

        let err = ApiError::InvalidCredentials;
        assert_eq!(err.to_string(), "invalid credentials");
    }

    #[test]
    fn test_most_errors_redirect_to_error_page() {
        for err in [
            ApiError::DuplicateEmail("a@x.com".to_string()),
            ApiError::InvalidCredentials,
            ApiError::Storage("down".to_string()),
            ApiError::Internal("oops".to_string()),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::FOUND);
            assert_eq!(response.headers()[header::LOCATION], "/error");
        }
    }

    #[test]
    fn test_token_errors_are_unauthorized() {
        let response = ApiError::InvalidToken("bad signature".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
