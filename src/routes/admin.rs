use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{PublicUser, Role},
    response,
    state::AppState,
};
use actix_web::{delete, get, patch, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Payload for `PATCH /admin/users/{id}/role`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// Lists every user, newest first, without credentials.
#[get("/users")]
pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let users: Vec<PublicUser> = state
        .users
        .list_users()
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();

    Ok(response::ok("Users fetched successfully", users).into_response())
}

/// Changes a user's role.
///
/// The target's next request already sees the new role; their tokens are untouched.
#[patch("/users/{id}/role")]
pub async fn update_user_role(
    state: web::Data<AppState>,
    actor: AuthenticatedUser,
    user_id: web::Path<Uuid>,
    payload: web::Json<UpdateRoleRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = user_id.into_inner();
    let role = payload.into_inner().role;

    let user = state
        .users
        .update_role(user_id, role)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    log::info!("Admin {} set role of user {} to {}", actor.id, user.id, role);
    Ok(response::ok("User role updated", PublicUser::from(user)).into_response())
}

/// Deletes a user and their session. Admins cannot delete themselves.
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    actor: AuthenticatedUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = user_id.into_inner();
    if user_id == actor.id {
        return Err(AppError::BadRequest("Cannot delete yourself".into()));
    }

    if !state.users.delete_user(user_id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }

    log::info!("Admin {} deleted user {}", actor.id, user_id);
    Ok(response::ok("User deleted successfully", json!({})).into_response())
}
