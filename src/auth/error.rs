use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::repo::StoreError;

/// Domain errors of the auth flows. Converted to a `{message}` JSON body at
/// the handler boundary; nothing below this type escapes as an unhandled
/// fault.
///
/// `InvalidCredentials` and `InvalidOrExpiredCode` are deliberately
/// undifferentiated: the caller cannot tell an unknown account from a wrong
/// password, or a wrong code from an expired one.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists")]
    AccountExists,
    #[error("User not found")]
    NotFound,
    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account setup incomplete. Please finish signup.")]
    IncompleteAccount,
    #[error("Email not verified yet")]
    NotVerified,
    #[error("Password already set for this account")]
    PasswordAlreadySet,
    #[error("Server error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            // Duplicate-key from a signup race reads the same as a found account.
            StoreError::DuplicateEmail => AuthError::AccountExists,
            StoreError::Other(e) => AuthError::Internal(e),
        }
    }
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::AccountExists => StatusCode::CONFLICT,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidOrExpiredCode => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::IncompleteAccount => StatusCode::BAD_REQUEST,
            AuthError::NotVerified => StatusCode::BAD_REQUEST,
            AuthError::PasswordAlreadySet => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Internal detail stays server-side; the caller gets an opaque message.
            AuthError::Internal(e) => {
                error!(error = %e, "internal error");
                "Server error".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_the_api_contract() {
        assert_eq!(
            AuthError::Validation("Email is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::AccountExists.status(), StatusCode::CONFLICT);
        assert_eq!(AuthError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::InvalidOrExpiredCode.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_key_maps_to_account_exists() {
        let err: AuthError = StoreError::DuplicateEmail.into();
        assert!(matches!(err, AuthError::AccountExists));
    }

    #[test]
    fn internal_error_renders_opaque_message() {
        let response = AuthError::Internal(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
