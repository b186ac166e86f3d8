use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
///
/// `verification_code` and `verification_code_expires_at` are set and cleared
/// together: both present while an email challenge is outstanding, both absent
/// otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                      // unique user ID, JWT subject
    pub email: String,                 // normalized email, unique
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // Argon2 hash, absent until signup completes
    pub is_verified: bool,             // true once an OTP check has succeeded
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    #[serde(skip_serializing)]
    pub verification_code_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// A fully registered account blocks a new signup for the same email.
    /// Unverified or password-less stubs are reused by the signup flow instead.
    pub fn is_fully_registered(&self) -> bool {
        self.is_verified && self.password_hash.is_some()
    }
}
