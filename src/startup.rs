use std::net::TcpListener;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::middleware::{Condition, ErrorHandlers, Logger};
use actix_web::{http::header, web, App, HttpServer};

use crate::config::{Config, Environment};
use crate::error::{self, AppError};
use crate::routes;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore};

/// CORS policy: configured origins only, with credentials so the token cookies travel.
pub fn cors(config: &Config) -> Cors {
    config
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials()
        .max_age(3600)
}

/// Internal error details reach the caller only in development mode.
pub fn error_details<B: 'static>(environment: Environment) -> Condition<ErrorHandlers<B>> {
    Condition::new(environment.is_development(), error::detailed_errors())
}

/// Builds the shared state, choosing Postgres when `DATABASE_URL` is set.
pub async fn build_state(config: Config) -> Result<AppState, AppError> {
    match config.database_url.clone() {
        Some(url) => {
            let store = Arc::new(PgStore::connect(&url).await?);
            log::info!("Using Postgres store");
            Ok(AppState::new(config, store.clone(), store))
        }
        None => {
            log::warn!("DATABASE_URL not set; using the in-memory store");
            let store = Arc::new(MemoryStore::new());
            Ok(AppState::new(config, store.clone(), store))
        }
    }
}

/// Starts the HTTP server on an already-bound listener.
pub fn run(listener: TcpListener, state: web::Data<AppState>) -> Result<Server, std::io::Error> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(error_details(state.config.environment))
            .wrap(cors(&state.config))
            .wrap(Logger::default())
            .configure(routes::configure_app)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
