//! Startup admin provisioning from `ADMIN_EMAIL` / `ADMIN_PASSWORD` / `ADMIN_NAME`.

use crate::auth::hash_password;
use crate::config::AdminSeed;
use crate::error::AppError;
use crate::models::{user::normalize_email, NewUser, Role};
use crate::state::AppState;

#[derive(Debug, PartialEq, Eq)]
pub enum SeedOutcome {
    Skipped,
    Created,
    Promoted,
    AlreadyAdmin,
}

/// Ensures the configured admin account exists and holds the admin role.
///
/// An existing user with that email is promoted rather than recreated; their
/// password is left alone.
pub async fn seed_admin(state: &AppState) -> Result<SeedOutcome, AppError> {
    let Some(AdminSeed {
        email,
        password,
        name,
    }) = state.config.admin_seed.clone()
    else {
        log::info!("[seed] ADMIN_EMAIL or ADMIN_PASSWORD not set, skipping admin seed");
        return Ok(SeedOutcome::Skipped);
    };
    let email = normalize_email(&email);

    if let Some(existing) = state.users.find_by_email(&email).await? {
        if existing.role == Role::Admin {
            log::info!("[seed] Admin {} already exists", email);
            return Ok(SeedOutcome::AlreadyAdmin);
        }
        state.users.update_role(existing.id, Role::Admin).await?;
        log::info!("[seed] Existing user {} promoted to admin", email);
        return Ok(SeedOutcome::Promoted);
    }

    let password_hash = hash_password(&password, state.config.bcrypt_cost)?;
    state
        .users
        .create_user(NewUser {
            name,
            email: email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await?;
    log::info!("[seed] Admin user {} created", email);
    Ok(SeedOutcome::Created)
}
