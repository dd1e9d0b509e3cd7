//! Session lifecycle: token issuing, cookie transport, request authentication,
//! and role gating.

pub mod cookies;
pub mod extractors;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod session;
pub mod token;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{user::normalize_email, PublicUser};

pub use extractors::AuthenticatedUser;
pub use guard::{authorize, RequireRole};
pub use middleware::{authenticate, SessionMiddleware};
pub use password::{hash_password, verify_password};
pub use session::{end_session, rotate_session, start_session};
pub use token::{Claims, TokenIssuer, TokenKind, TokenPair};

/// The single message for every access-token failure.
pub const INVALID_SESSION: &str = "Invalid or expired token";
/// The single message for every refresh failure after the cookie was found.
pub const INVALID_REFRESH: &str = "Invalid refresh token";

/// Payload for `POST /auth/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Optional display name; defaults to the email's local part.
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: Option<String>,
    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,
    /// bcrypt ignores everything past 72 bytes, so longer passwords are refused.
    #[validate(
        length(min = 6, message = "Password must be at least 6 characters"),
        custom = "validate_password_bytes"
    )]
    pub password: String,
}

/// Longest password bcrypt hashes without truncation, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() <= MAX_PASSWORD_BYTES {
        return Ok(());
    }
    let mut err = ValidationError::new("password_bytes");
    err.message = Some(Cow::from("Password must be at most 72 bytes"));
    Err(err)
}

impl SignupRequest {
    /// Trims the name (dropping it when blank) and normalizes the email.
    pub fn normalized(self) -> Self {
        Self {
            name: self
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// Payload for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// `data` of a successful signup or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    /// The access token, also delivered as the `accessToken` cookie.
    pub token: String,
}

/// `data` of a successful refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}
