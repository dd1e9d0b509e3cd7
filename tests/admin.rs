mod common;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{access_cookie, refresh_cookie, test_state};
use taskforge_auth::routes;
use taskforge_auth::seed::{seed_admin, SeedOutcome};

#[actix_rt::test]
async fn test_role_change_applies_to_existing_token() {
    let state = test_state();
    assert_eq!(seed_admin(&state).await.unwrap(), SeedOutcome::Created);
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(routes::configure_app),
    )
    .await;

    let alice = common::signup(&app, "alice@example.com", "secret1").await;
    let admin = common::login(&app, "admin@example.com", "adminpass").await;
    let alice_id = alice.user["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/users")
        .cookie(access_cookie(&alice.access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Access denied. Required role(s): admin");

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/admin/users/{}/role", alice_id))
        .cookie(access_cookie(&admin.access))
        .set_json(json!({ "role": "admin" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User role updated");
    assert_eq!(body["data"]["role"], "admin");

    // Same access token as before the promotion.
    let req = test::TestRequest::get()
        .uri("/api/v1/admin/users")
        .cookie(access_cookie(&alice.access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/admin/users/{}/role", alice_id))
        .cookie(access_cookie(&admin.access))
        .set_json(json!({ "role": "user" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/users")
        .cookie(access_cookie(&alice.access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_admin_routes_require_a_session() {
    let app = test::init_service(
        App::new()
            .app_data(test_state())
            .configure(routes::configure_app),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/users")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid or expired token");
}

#[actix_rt::test]
async fn test_list_users_newest_first_without_credentials() {
    let state = test_state();
    seed_admin(&state).await.unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(routes::configure_app),
    )
    .await;

    common::signup(&app, "first@example.com", "secret1").await;
    common::signup(&app, "second@example.com", "secret1").await;
    let admin = common::login(&app, "admin@example.com", "adminpass").await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/users")
        .cookie(access_cookie(&admin.access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Users fetched successfully");
    let users = body["data"].as_array().unwrap();
    let emails: Vec<&str> = users.iter().map(|u| u["email"].as_str().unwrap()).collect();
    assert_eq!(
        emails,
        vec!["second@example.com", "first@example.com", "admin@example.com"]
    );
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
}

#[actix_rt::test]
async fn test_delete_user_ends_their_session() {
    let state = test_state();
    seed_admin(&state).await.unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(routes::configure_app),
    )
    .await;

    let victim = common::signup(&app, "victim@example.com", "secret1").await;
    let admin = common::login(&app, "admin@example.com", "adminpass").await;
    let victim_id = victim.user["id"].as_str().unwrap().to_string();
    let admin_id = admin.user["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/users/{}", admin_id))
        .cookie(access_cookie(&admin.access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Cannot delete yourself");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/users/{}", victim_id))
        .cookie(access_cookie(&admin.access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User deleted successfully");

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .cookie(access_cookie(&victim.access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh-token")
        .cookie(refresh_cookie(&victim.refresh))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/users/{}", victim_id))
        .cookie(access_cookie(&admin.access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_update_role_unknown_or_malformed_id() {
    let state = test_state();
    seed_admin(&state).await.unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(routes::configure_app),
    )
    .await;
    let admin = common::login(&app, "admin@example.com", "adminpass").await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/admin/users/{}/role", uuid::Uuid::new_v4()))
        .cookie(access_cookie(&admin.access))
        .set_json(json!({ "role": "admin" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User not found");

    let req = test::TestRequest::patch()
        .uri("/api/v1/admin/users/not-a-uuid/role")
        .cookie(access_cookie(&admin.access))
        .set_json(json!({ "role": "admin" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/admin/users/{}/role", admin.user["id"].as_str().unwrap()))
        .cookie(access_cookie(&admin.access))
        .set_json(json!({ "role": "superuser" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
