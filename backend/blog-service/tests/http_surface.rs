//! Wire-level tests for the JSON surface: toggle payload shapes, the
//! self-follow error body, identity enforcement, and the profile counters.

mod common;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::json;
use uuid::Uuid;

use blog_service::handlers;

macro_rules! test_app {
    ($pool:expr, $dispatcher:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new($dispatcher.clone()))
                .configure(handlers::configure),
        )
        .await
    };
}

macro_rules! register_user {
    ($app:expr, $prefix:expr) => {{
        let username = format!("{}-{}", $prefix, Uuid::new_v4());
        let body: serde_json::Value = test::call_and_read_body_json(
            &$app,
            test::TestRequest::post()
                .uri("/users")
                .set_json(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "long-enough-password",
                }))
                .to_request(),
        )
        .await;
        (body["id"].as_str().expect("user id").to_string(), username)
    }};
}

macro_rules! create_post {
    ($app:expr, $author_id:expr) => {{
        let body: serde_json::Value = test::call_and_read_body_json(
            &$app,
            test::TestRequest::post()
                .uri("/posts")
                .insert_header(("x-user-id", $author_id.as_str()))
                .set_json(json!({
                    "title": "Hello",
                    "content": "# Hello\n\nworld",
                    "tags": ["rust"],
                }))
                .to_request(),
        )
        .await;
        body["id"].as_str().expect("post id").to_string()
    }};
}

#[actix_web::test]
async fn like_toggle_reports_wire_shape() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let app = test_app!(pool, dispatcher);

    let (author_id, _) = register_user!(app, "author");
    let (reader_id, _) = register_user!(app, "reader");
    let post_id = create_post!(app, author_id);

    let body: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{post_id}/like"))
            .insert_header(("x-user-id", reader_id.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(body, json!({"liked": true, "total_likes": 1}));

    let body: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{post_id}/like"))
            .insert_header(("x-user-id", reader_id.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(body, json!({"liked": false, "total_likes": 0}));
}

#[actix_web::test]
async fn subscribe_toggle_reports_wire_shape() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let app = test_app!(pool, dispatcher);

    let (_, author_name) = register_user!(app, "author");
    let (fan_id, _) = register_user!(app, "fan");

    let body: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/users/{author_name}/subscribe"))
            .insert_header(("x-user-id", fan_id.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(body, json!({"subscribed": true, "followers_count": 1}));

    let body: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/users/{author_name}/subscribe"))
            .insert_header(("x-user-id", fan_id.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(body, json!({"subscribed": false, "followers_count": 0}));
}

#[actix_web::test]
async fn self_subscription_returns_400_with_error_body() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let app = test_app!(pool, dispatcher);

    let (user_id, username) = register_user!(app, "loner");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/users/{username}/subscribe"))
            .insert_header(("x-user-id", user_id.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "cannot follow self", "status": 400}));
}

#[actix_web::test]
async fn missing_identity_header_is_unauthorized() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let app = test_app!(pool, dispatcher);

    let (author_id, _) = register_user!(app, "author");
    let post_id = create_post!(app, author_id);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{post_id}/like"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn profile_carries_subscription_state_and_counters() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let app = test_app!(pool, dispatcher);

    let (author_id, author_name) = register_user!(app, "author");
    let (fan_id, fan_name) = register_user!(app, "fan");
    let post_id = create_post!(app, author_id);

    test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/users/{author_name}/subscribe"))
            .insert_header(("x-user-id", fan_id.as_str()))
            .to_request(),
    )
    .await;
    test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{post_id}/like"))
            .insert_header(("x-user-id", fan_id.as_str()))
            .to_request(),
    )
    .await;

    // The fan's view of the author's profile.
    let body: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/users/{author_name}"))
            .insert_header(("x-user-id", fan_id.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(body["is_subscribed"], json!(true));
    assert_eq!(body["followers_count"], json!(1));
    assert_eq!(body["following_count"], json!(0));
    assert_eq!(body["total_likes"], json!(1));

    // Own profile never reports a self-subscription.
    let body: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/users/{fan_name}"))
            .insert_header(("x-user-id", fan_id.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(body["is_subscribed"], json!(false));
    assert_eq!(body["following_count"], json!(1));

    // Anonymous viewers get the counters without subscription state.
    let body: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/users/{author_name}"))
            .to_request(),
    )
    .await;
    assert_eq!(body["is_subscribed"], json!(false));
    assert_eq!(body["followers_count"], json!(1));
}

#[actix_web::test]
async fn subscription_listings_are_self_only() {
    let (_pg, pool) = common::setup_db().await;
    let dispatcher = common::dispatcher(&pool);
    let app = test_app!(pool, dispatcher);

    let (author_id, author_name) = register_user!(app, "author");
    let (fan_id, fan_name) = register_user!(app, "fan");

    test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/users/{author_name}/subscribe"))
            .insert_header(("x-user-id", fan_id.as_str()))
            .to_request(),
    )
    .await;

    let body: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/users/{fan_name}/subscriptions"))
            .insert_header(("x-user-id", fan_id.as_str()))
            .to_request(),
    )
    .await;
    let entries = body.as_array().expect("listing must be an array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["username"], json!(author_name));

    let body: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/users/{author_name}/subscribers"))
            .insert_header(("x-user-id", author_id.as_str()))
            .to_request(),
    )
    .await;
    let entries = body.as_array().expect("listing must be an array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["username"], json!(fan_name));

    // Someone else's listing is indistinguishable from a missing resource.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/users/{author_name}/subscriptions"))
            .insert_header(("x-user-id", fan_id.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
