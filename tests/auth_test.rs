mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;

use promo_orders_api::entities::admin_user::{self, Entity as AdminUserEntity};

use common::TestApp;

fn signup_payload(email: &str) -> serde_json::Value {
    json!({
        "email": email,
        "password": "sup3rsecret",
        "full_name": "Noy Keomany",
        "phone_number": "0205551234",
        "dob": "1991-03-09"
    })
}

#[tokio::test]
async fn signup_creates_an_inactive_admin_account() {
    let app = TestApp::new().await;

    let body = app
        .request_json(
            Method::POST,
            "/auth/signup",
            Some(signup_payload("noy@example.com")),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(body["message"], "Sign up successfully");

    let saved = AdminUserEntity::find()
        .filter(admin_user::Column::Email.eq("noy@example.com"))
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("admin should exist");
    assert_eq!(saved.status, "INACTIVE");
    assert_eq!(saved.role, "ADMIN");
    // password is stored hashed, never in the clear
    assert_ne!(saved.password_hash, "sup3rsecret");
    assert!(saved.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn signup_rejects_duplicate_email() {
    let app = TestApp::new().await;

    app.request_json(
        Method::POST,
        "/auth/signup",
        Some(signup_payload("dup@example.com")),
        StatusCode::CREATED,
    )
    .await;

    let body = app
        .request_json(
            Method::POST,
            "/auth/signup",
            Some(signup_payload("dup@example.com")),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn signup_validates_its_payload() {
    let app = TestApp::new().await;

    let mut bad_email = signup_payload("nope");
    bad_email["email"] = json!("nope");
    app.request_json(
        Method::POST,
        "/auth/signup",
        Some(bad_email),
        StatusCode::BAD_REQUEST,
    )
    .await;

    let mut short_password = signup_payload("short@example.com");
    short_password["password"] = json!("tiny");
    app.request_json(
        Method::POST,
        "/auth/signup",
        Some(short_password),
        StatusCode::BAD_REQUEST,
    )
    .await;

    let mut bad_phone = signup_payload("phone@example.com");
    bad_phone["phone_number"] = json!("123");
    app.request_json(
        Method::POST,
        "/auth/signup",
        Some(bad_phone),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn inactive_accounts_are_rejected_at_login() {
    let app = TestApp::new().await;

    app.request_json(
        Method::POST,
        "/auth/signup",
        Some(signup_payload("pending@example.com")),
        StatusCode::CREATED,
    )
    .await;

    // fresh signups are INACTIVE and cannot log in
    let body = app
        .request_json(
            Method::POST,
            "/auth/login",
            Some(json!({"email": "pending@example.com", "password": "sup3rsecret"})),
            StatusCode::UNAUTHORIZED,
        )
        .await;
    assert_eq!(body["message"], "inactive");

    // activation is an out-of-band act; once flipped, login succeeds
    let saved = AdminUserEntity::find()
        .filter(admin_user::Column::Email.eq("pending@example.com"))
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: admin_user::ActiveModel = saved.into();
    active.status = Set("ACTIVE".to_string());
    active.update(&*app.state.db).await.unwrap();

    let body = app
        .request_json(
            Method::POST,
            "/auth/login",
            Some(json!({"email": "pending@example.com", "password": "sup3rsecret"})),
            StatusCode::OK,
        )
        .await;
    assert!(body["access_token"].as_str().is_some());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_email() {
    let app = TestApp::new().await;
    app.seed_admin("known@example.com", "sup3rsecret", "ACTIVE")
        .await;

    let body = app
        .request_json(
            Method::POST,
            "/auth/login",
            Some(json!({"email": "known@example.com", "password": "wrong"})),
            StatusCode::UNAUTHORIZED,
        )
        .await;
    assert_eq!(body["message"], "Invalid email or password");

    app.request_json(
        Method::POST,
        "/auth/login",
        Some(json!({"email": "nobody@example.com", "password": "sup3rsecret"})),
        StatusCode::UNAUTHORIZED,
    )
    .await;
}

#[tokio::test]
async fn refresh_rotates_the_token_pair() {
    let app = TestApp::new().await;
    app.seed_admin("rotate@example.com", "sup3rsecret", "ACTIVE")
        .await;

    let login = app
        .request_json(
            Method::POST,
            "/auth/login",
            Some(json!({"email": "rotate@example.com", "password": "sup3rsecret"})),
            StatusCode::OK,
        )
        .await;
    let refresh_token = login["refresh_token"].as_str().unwrap();

    let refreshed = app
        .request_json(
            Method::POST,
            "/auth/refresh",
            Some(json!({"refresh_token": refresh_token})),
            StatusCode::OK,
        )
        .await;
    assert!(refreshed["access_token"].as_str().is_some());

    // an access token is not a refresh grant for a deactivated account
    let saved = AdminUserEntity::find()
        .filter(admin_user::Column::Email.eq("rotate@example.com"))
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    let mut inactive: admin_user::ActiveModel = saved.into();
    inactive.status = Set("INACTIVE".to_string());
    inactive.update(&*app.state.db).await.unwrap();

    app.request_json(
        Method::POST,
        "/auth/refresh",
        Some(json!({"refresh_token": refresh_token})),
        StatusCode::UNAUTHORIZED,
    )
    .await;
}
