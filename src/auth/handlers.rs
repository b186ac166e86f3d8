use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            CredentialsRequest, LoginResponse, MessageResponse, OtpResendRequest, SignupStartRequest,
            TokenResponse, VerifyRequest,
        },
        error::AuthError,
        service::LoginOutcome,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/start", post(signup_start))
        .route("/auth/signup/complete", post(signup_complete))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/login", post(login))
        .route("/auth/login/verify", post(login_verify))
        .route("/auth/otp/resend", post(otp_resend))
}

fn require(value: &str, message: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation(message.into()));
    }
    Ok(())
}

/// Step 1: start signup with email only, send OTP.
#[instrument(skip(state, payload))]
pub async fn signup_start(
    State(state): State<AppState>,
    Json(payload): Json<SignupStartRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    require(&payload.email, "Email is required")?;

    let email = state.auth.signup_start(&payload.email).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created. Verify your email with the code sent.".into(),
            email,
        }),
    ))
}

/// Step 2: verify email with OTP during signup.
#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    require(&payload.email, "Email and code are required")?;
    require(&payload.code, "Email and code are required")?;

    let email = state.auth.verify_email(&payload.email, &payload.code).await?;
    Ok(Json(MessageResponse {
        message: "Email verified. You can now create a password.".into(),
        email,
    }))
}

/// Step 3: complete signup by setting a password after email verification.
#[instrument(skip(state, payload))]
pub async fn signup_complete(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    require(&payload.email, "Email and password are required")?;
    require(&payload.password, "Email and password are required")?;

    let (token, email) = state
        .auth
        .signup_complete(&payload.email, &payload.password)
        .await?;
    Ok(Json(TokenResponse {
        message: "Account created successfully".into(),
        token,
        email,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    require(&payload.email, "Email and password are required")?;
    require(&payload.password, "Email and password are required")?;

    let response = match state.auth.login(&payload.email, &payload.password).await? {
        LoginOutcome::Authenticated { token, email } => LoginResponse {
            message: "Login successful".into(),
            token: Some(token),
            requires_verification: None,
            email,
        },
        LoginOutcome::RequiresVerification { email } => LoginResponse {
            message: "Email not verified. Verification code sent.".into(),
            token: None,
            requires_verification: Some(true),
            email,
        },
    };
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn login_verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    require(&payload.email, "Email and code are required")?;
    require(&payload.code, "Email and code are required")?;

    let (token, email) = state
        .auth
        .login_verify(&payload.email, &payload.code)
        .await?;
    Ok(Json(TokenResponse {
        message: "Login verified".into(),
        token,
        email,
    }))
}

/// Generic OTP resend endpoint, usable from both signup and login flows.
#[instrument(skip(state, payload))]
pub async fn otp_resend(
    State(state): State<AppState>,
    Json(payload): Json<OtpResendRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    require(&payload.email, "Email is required")?;

    let context = payload.context.as_deref().unwrap_or("Generic");
    let email = state.auth.resend_otp(&payload.email, context).await?;
    Ok(Json(MessageResponse {
        message: "A new verification code has been sent.".into(),
        email,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signup_start_returns_created_with_normalized_email() {
        let state = AppState::fake();
        let (status, Json(body)) = signup_start(
            State(state),
            Json(SignupStartRequest {
                email: " A@Ex.com ".into(),
            }),
        )
        .await
        .expect("signup start");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.email, "a@ex.com");
    }

    #[tokio::test]
    async fn signup_start_requires_an_email() {
        let state = AppState::fake();
        let err = signup_start(State(state), Json(SignupStartRequest { email: "".into() }))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn verify_email_requires_both_fields() {
        let state = AppState::fake();
        let err = verify_email(
            State(state),
            Json(VerifyRequest {
                email: "a@ex.com".into(),
                code: "".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn login_unknown_email_is_unauthorized() {
        let state = AppState::fake();
        let err = login(
            State(state),
            Json(CredentialsRequest {
                email: "nobody@ex.com".into(),
                password: "pw123".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn otp_resend_unknown_email_is_not_found() {
        let state = AppState::fake();
        let err = otp_resend(
            State(state),
            Json(OtpResendRequest {
                email: "nobody@ex.com".into(),
                context: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }
}
