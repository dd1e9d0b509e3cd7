#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web};
use serde_json::{json, Value};

use taskforge_auth::auth::cookies::{ACCESS_COOKIE, REFRESH_COOKIE};
use taskforge_auth::config::{AdminSeed, Config, Environment, JwtSettings};
use taskforge_auth::AppState;

pub fn test_config() -> Config {
    Config {
        database_url: None,
        server_port: 0,
        server_host: "127.0.0.1".into(),
        environment: Environment::Test,
        jwt: JwtSettings {
            access_secret: "integration_access_secret".into(),
            refresh_secret: "integration_refresh_secret".into(),
            access_expiry_secs: 900,
            refresh_expiry_secs: 3600,
        },
        allowed_origins: vec!["http://localhost:3000".into()],
        bcrypt_cost: 4,
        admin_seed: Some(AdminSeed {
            email: "admin@example.com".into(),
            password: "adminpass".into(),
            name: "Admin".into(),
        }),
    }
}

pub fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState::in_memory(test_config()))
}

/// The token cookies set on a response, as `(access, refresh)`.
pub fn token_cookies<B>(resp: &ServiceResponse<B>) -> (Option<String>, Option<String>) {
    let mut access = None;
    let mut refresh = None;
    for cookie in resp.response().cookies() {
        match cookie.name() {
            ACCESS_COOKIE => access = Some(cookie.value().to_string()),
            REFRESH_COOKIE => refresh = Some(cookie.value().to_string()),
            _ => {}
        }
    }
    (access, refresh)
}

pub fn access_cookie(value: &str) -> Cookie<'static> {
    Cookie::new(ACCESS_COOKIE, value.to_string())
}

pub fn refresh_cookie(value: &str) -> Cookie<'static> {
    Cookie::new(REFRESH_COOKIE, value.to_string())
}

pub struct Session {
    pub user: Value,
    pub access: String,
    pub refresh: String,
}

async fn start<S, B>(app: &S, uri: &str, body: Value) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post().uri(uri).set_json(&body).to_request();
    let resp = test::call_service(app, req).await;
    assert!(resp.status().is_success(), "{} failed: {}", uri, resp.status());

    let (access, refresh) = token_cookies(&resp);
    let json: Value = test::read_body_json(resp).await;
    Session {
        user: json["data"]["user"].clone(),
        access: access.expect("access cookie"),
        refresh: refresh.expect("refresh cookie"),
    }
}

pub async fn signup<S, B>(app: &S, email: &str, password: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    start(
        app,
        "/api/v1/auth/signup",
        json!({ "email": email, "password": password }),
    )
    .await
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    start(
        app,
        "/api/v1/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await
}
