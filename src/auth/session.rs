//! Session state transitions.
//!
//! ```text
//! no-session --login/signup--> authenticated --refresh--> authenticated ...
//!                                   |
//!                                 logout --> revoked
//! ```
//!
//! A session is the one refresh token currently registered for a user. Starting a
//! session overwrites whatever was there; refreshing swaps it atomically; logging
//! out removes it.

use uuid::Uuid;

use crate::auth::token::TokenPair;
use crate::auth::INVALID_REFRESH;
use crate::error::AppError;
use crate::state::AppState;

/// Issues a pair and registers its refresh token as the user's only valid one.
pub async fn start_session(state: &AppState, user_id: Uuid) -> Result<TokenPair, AppError> {
    let tokens = state.tokens.issue_pair(user_id)?;
    state.sessions.store(user_id, &tokens.refresh_token).await?;
    log::info!("Session started for user {}", user_id);
    Ok(tokens)
}

/// Exchanges the presented refresh token for a new pair.
///
/// The presented token must verify against the refresh secret, belong to an existing
/// user, and be exactly the token currently stored for that user. The swap is a
/// compare-and-swap, so on any failure nothing is written and of two concurrent
/// refreshes with the same token only one succeeds.
pub async fn rotate_session(state: &AppState, presented: &str) -> Result<TokenPair, AppError> {
    let rejected = || AppError::Unauthorized(INVALID_REFRESH.to_string());

    let claims = state.tokens.verify_refresh(presented).map_err(|e| {
        log::warn!("Rejected refresh token: {}", e);
        rejected()
    })?;

    let user = state.users.find_by_id(claims.sub).await?.ok_or_else(|| {
        log::warn!("Rejected refresh token: user {} no longer exists", claims.sub);
        rejected()
    })?;

    let tokens = state.tokens.issue_pair(user.id)?;
    if !state
        .sessions
        .rotate(user.id, presented, &tokens.refresh_token)
        .await?
    {
        log::warn!(
            "Rejected refresh token: not the current token for user {}",
            user.id
        );
        return Err(rejected());
    }

    log::debug!("Rotated refresh token for user {}", user.id);
    Ok(tokens)
}

/// Revokes the user's session. Having nothing to revoke is not an error.
pub async fn end_session(state: &AppState, user_id: Uuid) -> Result<(), AppError> {
    if state.sessions.revoke(user_id).await? {
        log::info!("Session revoked for user {}", user_id);
    } else {
        log::debug!("Logout for user {} without a stored session", user_id);
    }
    Ok(())
}
