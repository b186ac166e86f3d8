use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::auth::error::AuthError;
use crate::auth::jwt::JwtKeys;
use crate::auth::otp;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::UserStore;
use crate::auth::repo_types::User;
use crate::mailer::OtpNotifier;

/// Verification codes are valid for 10 minutes from issuance.
const OTP_TTL: Duration = Duration::minutes(10);

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Case/whitespace normalization applied to every write and lookup.
pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A code is accepted only while a challenge is outstanding, matches exactly,
/// and has not reached its expiry instant (the boundary counts as expired).
fn code_matches(user: &User, supplied: &str, now: OffsetDateTime) -> bool {
    match (&user.verification_code, user.verification_code_expires_at) {
        (Some(code), Some(expires_at)) => code == supplied && now < expires_at,
        _ => false,
    }
}

/// Login either completes with a token or pauses on an email challenge.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Authenticated { token: String, email: String },
    RequiresVerification { email: String },
}

/// The signup/login/verification state machine.
///
/// Store, notifier and token keys are injected at construction; every
/// operation is an independent unit of work with no per-account locking
/// (concurrent writers race at the store, last write wins).
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    mailer: Arc<dyn OtpNotifier>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, mailer: Arc<dyn OtpNotifier>, keys: JwtKeys) -> Self {
        Self {
            store,
            mailer,
            keys,
        }
    }

    /// Issue a fresh code on the account: persist first, then notify
    /// best-effort. An undelivered code lands in the log instead; issuance
    /// itself never fails on delivery problems.
    async fn issue_otp(&self, user: &mut User, label: &str) -> Result<String, AuthError> {
        let code = otp::generate_code();
        user.verification_code = Some(code.clone());
        user.verification_code_expires_at = Some(OffsetDateTime::now_utc() + OTP_TTL);
        self.store.save(user).await?;

        let outcome = self.mailer.send_otp(&user.email, &code, label).await;
        if outcome.sent {
            info!(email = %user.email, label = %label, "otp sent");
        } else {
            warn!(
                email = %user.email,
                label = %label,
                error = outcome.error.as_deref().unwrap_or("not configured"),
                "otp email failed"
            );
            info!(email = %user.email, code = %code, "fallback otp");
        }

        Ok(code)
    }

    /// Check and consume the outstanding code. On success the challenge is
    /// cleared and the account marked verified; on failure the account is
    /// left untouched.
    async fn check_otp(&self, user: &mut User, supplied: &str) -> Result<(), AuthError> {
        let now = OffsetDateTime::now_utc();
        if !code_matches(user, supplied, now) {
            return Err(AuthError::InvalidOrExpiredCode);
        }

        user.is_verified = true;
        user.verification_code = None;
        user.verification_code_expires_at = None;
        self.store.save(user).await?;
        Ok(())
    }

    /// Start signup with email only and send an OTP. An existing account that
    /// is fully registered is a conflict; an incomplete one (no password, or
    /// unverified) re-enters the flow in place.
    #[instrument(skip(self))]
    pub async fn signup_start(&self, email: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::Validation("Invalid email".into()));
        }

        let existing = self.store.find_by_email(&email).await?;
        if let Some(user) = &existing {
            if user.is_fully_registered() {
                warn!(email = %email, "signup for existing account");
                return Err(AuthError::AccountExists);
            }
        }

        let mut user = match existing {
            Some(user) => user,
            None => self.store.create(&email).await?,
        };

        self.issue_otp(&mut user, "Signup").await?;
        info!(user_id = %user.id, email = %user.email, "signup started");
        Ok(user.email)
    }

    /// Verify email ownership with the signup OTP.
    #[instrument(skip(self, code))]
    pub async fn verify_email(&self, email: &str, code: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        let mut user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        self.check_otp(&mut user, code).await?;
        info!(user_id = %user.id, email = %user.email, "email verified");
        Ok(user.email)
    }

    /// Set the password after email verification and issue a token.
    /// One-shot: a password can not be replaced through this path.
    #[instrument(skip(self, password))]
    pub async fn signup_complete(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(String, String), AuthError> {
        let email = normalize_email(email);
        let mut user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !user.is_verified {
            return Err(AuthError::NotVerified);
        }
        if user.password_hash.is_some() {
            return Err(AuthError::PasswordAlreadySet);
        }

        user.password_hash = Some(hash_password(password)?);
        self.store.save(&user).await?;

        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, email = %user.email, "signup completed");
        Ok((token, user.email))
    }

    /// Password login. Unknown accounts and wrong passwords fail the same
    /// way; an unverified account gets a fresh code and a challenge instead
    /// of a token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = normalize_email(email);
        let user = self.store.find_by_email(&email).await?;
        let Some(mut user) = user else {
            warn!(email = %email, "login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(hash) = user.password_hash.clone() else {
            return Err(AuthError::IncompleteAccount);
        };

        if !verify_password(password, &hash)? {
            warn!(user_id = %user.id, "login with invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_verified {
            self.issue_otp(&mut user, "Login").await?;
            return Ok(LoginOutcome::RequiresVerification { email: user.email });
        }

        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok(LoginOutcome::Authenticated {
            token,
            email: user.email,
        })
    }

    /// Clear the login challenge and finish the paused login with a token.
    #[instrument(skip(self, code))]
    pub async fn login_verify(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(String, String), AuthError> {
        let email = normalize_email(email);
        let mut user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        self.check_otp(&mut user, code).await?;

        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, email = %user.email, "login verified");
        Ok((token, user.email))
    }

    /// Re-issue an OTP for any existing account, whatever its verification
    /// state. Usable from both the signup and login flows.
    #[instrument(skip(self))]
    pub async fn resend_otp(&self, email: &str, context: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        let mut user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        self.issue_otp(&mut user, &format!("{} resend", context))
            .await?;
        Ok(user.email)
    }
}
