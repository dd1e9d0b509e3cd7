//! Persistence seams.
//!
//! Identity records (`UserRepository`) and sessions (`SessionStore`) are kept apart:
//! a session is nothing more than the fingerprint of the single refresh token that is
//! currently valid for a user. Overwriting it invalidates the previous token.
//!
//! Two backends implement both traits: [`PgStore`] for Postgres and [`MemoryStore`]
//! for tests and database-less development runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, Role, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Inserts a user. A taken email yields `AppError::BadRequest`.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Looks up by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    /// Returns the updated user, or `None` when no such user exists.
    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, AppError>;

    /// Removes the user and any session they hold. Returns whether a user was removed.
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Makes `refresh_token` the only valid refresh token for the user.
    async fn store(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AppError>;

    /// Atomically replaces `presented` with `replacement`.
    ///
    /// Succeeds only if `presented` is the token currently stored for the user.
    /// Of two concurrent calls with the same `presented` token at most one returns `true`.
    async fn rotate(
        &self,
        user_id: Uuid,
        presented: &str,
        replacement: &str,
    ) -> Result<bool, AppError>;

    /// Forgets the user's refresh token. Returns whether one was stored.
    async fn revoke(&self, user_id: Uuid) -> Result<bool, AppError>;
}

/// SHA-256 hex digest of a refresh token. Only fingerprints are persisted.
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
