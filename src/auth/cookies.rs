//! Transport of the token pair as HTTP-only cookies.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpResponseBuilder;

use crate::auth::token::TokenPair;
use crate::config::Environment;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Cookie lifetimes depend on the deployment mode, not on the token TTLs.
pub fn access_cookie_max_age(env: Environment) -> Duration {
    if env.is_production() {
        Duration::minutes(15)
    } else {
        Duration::hours(2)
    }
}

pub fn refresh_cookie_max_age(env: Environment) -> Duration {
    if env.is_production() {
        Duration::days(7)
    } else {
        Duration::days(20)
    }
}

fn token_cookie(name: &'static str, value: String, max_age: Duration, env: Environment) -> Cookie<'static> {
    let same_site = if env.is_production() {
        SameSite::None
    } else {
        SameSite::Lax
    };

    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(env.is_production())
        .same_site(same_site)
        .max_age(max_age)
        .finish()
}

/// Attaches both token cookies to the response being built.
pub fn set_token_cookies(builder: &mut HttpResponseBuilder, tokens: &TokenPair, env: Environment) {
    builder.cookie(token_cookie(
        ACCESS_COOKIE,
        tokens.access_token.clone(),
        access_cookie_max_age(env),
        env,
    ));
    builder.cookie(token_cookie(
        REFRESH_COOKIE,
        tokens.refresh_token.clone(),
        refresh_cookie_max_age(env),
        env,
    ));
}

/// Instructs the client to drop both token cookies.
pub fn clear_token_cookies(builder: &mut HttpResponseBuilder) {
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        let mut cookie = Cookie::build(name, "").path("/").http_only(true).finish();
        cookie.make_removal();
        builder.cookie(cookie);
    }
}
