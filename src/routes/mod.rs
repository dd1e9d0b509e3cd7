pub mod admin;
pub mod auth;
pub mod health;

use actix_web::{error::InternalError, web, HttpRequest, HttpResponse, ResponseError};

use crate::auth::{RequireRole, SessionMiddleware};
use crate::error::AppError;

/// Versioned prefix for every API route.
pub const API_PREFIX: &str = "/api/v1";

/// Routes mounted under [`API_PREFIX`].
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::signup)
            .service(auth::login)
            .service(auth::refresh_token)
            .service(auth::logout),
    )
    .service(
        // Outermost wrap runs first: authenticate, then check the role.
        web::scope("/admin")
            .wrap(RequireRole::admin())
            .wrap(SessionMiddleware)
            .service(admin::list_users)
            .service(admin::update_user_role)
            .service(admin::delete_user),
    );
}

/// The complete application: health check, API scope, extractor error
/// handling, and the fallback 404.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(health::health)
        .service(web::scope(API_PREFIX).configure(config))
        .default_service(web::route().to(not_found));
}

/// Malformed JSON bodies become `400` envelopes.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let app_err = AppError::BadRequest(err.to_string());
        let response = app_err.error_response();
        InternalError::from_response(err, response).into()
    })
}

/// Unparseable path segments (e.g. a non-UUID id) become `400` envelopes.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let response = AppError::BadRequest("Invalid path parameter".into()).error_response();
        InternalError::from_response(err, response).into()
    })
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    log::debug!("No route for {} {}", req.method(), req.path());
    AppError::NotFound("Route not found".into()).error_response()
}
