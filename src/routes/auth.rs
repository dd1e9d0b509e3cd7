use crate::{
    auth::{
        cookies::{clear_token_cookies, set_token_cookies, REFRESH_COOKIE},
        end_session, hash_password, rotate_session, start_session, verify_password,
        AuthResponse, AuthenticatedUser, LoginRequest, RefreshResponse, SessionMiddleware,
        SignupRequest,
    },
    error::AppError,
    models::{
        user::{default_name, normalize_email},
        NewUser, Role, User,
    },
    response::{self, ApiResponse},
    state::AppState,
};
use actix_web::{http::StatusCode, post, web, HttpRequest, HttpResponse};
use serde_json::json;
use validator::Validate;

/// Runs bcrypt off the async workers.
async fn blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Blocking task failed: {}", e)))?
}

/// Starts a session for `user` and answers with the user, the access token,
/// and both token cookies.
async fn session_response(
    state: &AppState,
    user: User,
    status: StatusCode,
    message: &str,
) -> Result<HttpResponse, AppError> {
    let tokens = start_session(state, user.id).await?;

    let body = ApiResponse::new(
        status,
        message,
        AuthResponse {
            user: user.into(),
            token: tokens.access_token.clone(),
        },
    );
    let mut builder = body.builder();
    set_token_cookies(&mut builder, &tokens, state.config.environment);
    Ok(body.finish(builder))
}

/// Register a new user
///
/// Creates a `user`-role account, signs it in, and sets both token cookies.
///
/// ## Responses:
/// - `201 Created`: `{user, token}`.
/// - `400 Bad Request`: The email is already registered, or the body is malformed.
/// - `422 Unprocessable Entity`: Field validation failed.
#[post("/signup")]
pub async fn signup(
    state: web::Data<AppState>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let fallback_name = default_name(&payload.email);
    let payload = payload.normalized();
    payload.validate()?;

    if state.users.find_by_email(&payload.email).await?.is_some() {
        return Err(AppError::BadRequest(
            "User with this email already exists".into(),
        ));
    }

    let cost = state.config.bcrypt_cost;
    let password = payload.password;
    let password_hash = blocking(move || hash_password(&password, cost)).await?;

    let name = payload.name.unwrap_or(fallback_name);

    let user = state
        .users
        .create_user(NewUser {
            name,
            email: payload.email,
            password_hash,
            role: Role::User,
        })
        .await?;
    log::info!("Registered user {}", user.id);

    session_response(&state, user, StatusCode::CREATED, "User registered successfully").await
}

/// Login user
///
/// Checks the credentials and starts a new session, replacing any previous one.
///
/// ## Responses:
/// - `200 OK`: `{user, token}`.
/// - `401 Unauthorized`: Unknown email or wrong password (indistinguishable).
/// - `422 Unprocessable Entity`: Field validation failed.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let mut payload = payload.into_inner();
    payload.email = normalize_email(&payload.email);
    payload.validate()?;

    let user = match state.users.find_by_email(&payload.email).await? {
        Some(user) => user,
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    let password = payload.password;
    let hashed = user.password_hash.clone();
    if !blocking(move || verify_password(&password, &hashed)).await? {
        log::warn!("Failed login for user {}", user.id);
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    session_response(&state, user, StatusCode::OK, "Login successful").await
}

/// Rotate the session
///
/// Exchanges the `refreshToken` cookie for a new token pair. The presented token
/// stops working as soon as this succeeds.
///
/// ## Responses:
/// - `200 OK`: `{token}`, both cookies replaced.
/// - `401 Unauthorized`: Cookie missing, token invalid or expired, user gone,
///   or the token is not the one currently registered.
#[post("/refresh-token")]
pub async fn refresh_token(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let presented = req
        .cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Refresh token not found in cookie".into()))?;

    let tokens = rotate_session(&state, &presented).await?;

    let body = response::ok(
        "Token refreshed successfully",
        RefreshResponse {
            token: tokens.access_token.clone(),
        },
    );
    let mut builder = body.builder();
    set_token_cookies(&mut builder, &tokens, state.config.environment);
    Ok(body.finish(builder))
}

/// Logout user
///
/// Revokes the stored refresh token and removes both cookies.
///
/// ## Responses:
/// - `200 OK`: Always, once authenticated; also when there was no session to revoke.
/// - `401 Unauthorized`: No valid access token.
#[post("/logout", wrap = "SessionMiddleware")]
pub async fn logout(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    end_session(&state, user.id).await?;

    let body = response::ok("Logged out successfully", json!([]));
    let mut builder = body.builder();
    clear_token_cookies(&mut builder);
    Ok(body.finish(builder))
}
