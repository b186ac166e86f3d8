use serde::{Deserialize, Serialize};

/// Request body for the email-only signup start.
#[derive(Debug, Deserialize)]
pub struct SignupStartRequest {
    #[serde(default)]
    pub email: String,
}

/// Request body for OTP checks (signup and login verification).
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

/// Request body for signup completion and login.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for OTP resend; context labels the triggering flow.
#[derive(Debug, Deserialize)]
pub struct OtpResendRequest {
    #[serde(default)]
    pub email: String,
    pub context: Option<String>,
}

/// Response for operations that only acknowledge progress.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub email: String,
}

/// Response carrying a freshly minted session token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
    pub email: String,
}

/// Login response: a token, or a verification challenge instead.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_verification: Option<bool>,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_response_has_no_token_key() {
        let body = LoginResponse {
            message: "Email not verified. Verification code sent.".into(),
            token: None,
            requires_verification: Some(true),
            email: "a@ex.com".into(),
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert!(json.get("token").is_none());
        assert_eq!(json["requiresVerification"], true);
        assert_eq!(json["email"], "a@ex.com");
    }

    #[test]
    fn authenticated_response_omits_the_challenge_flag() {
        let body = LoginResponse {
            message: "Login successful".into(),
            token: Some("jwt".into()),
            requires_verification: None,
            email: "a@ex.com".into(),
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["token"], "jwt");
        assert!(json.get("requiresVerification").is_none());
    }
}
