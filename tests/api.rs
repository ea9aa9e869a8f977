//! End-to-end scenarios against the router, over the in-memory backends.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use sociable::{
    config::Config,
    router,
    search::MemoryIndex,
    state::State,
    store::MemoryStore,
};

fn test_app() -> Router {
    let config = Config {
        port: 0,
        redis_url: String::new(),
        meili_url: String::new(),
        meili_key: String::new(),
        jwt_secret: "test-secret".to_string(),
        assets_dir: std::env::temp_dir()
            .join("sociable-test-assets")
            .to_string_lossy()
            .into_owned(),
        token_ttl_secs: 3600,
        standalone: true,
    };
    let state = State::assemble(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryIndex::new()),
    );
    router(state)
}

fn multipart(fields: &[(&str, &str)]) -> (String, String) {
    let boundary = "test-boundary";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &Router, first_name: &str, email: &str) -> Value {
    let (content_type, body) = multipart(&[
        ("firstName", first_name),
        ("lastName", "Tester"),
        ("email", email),
        ("password", "hunter22"),
        ("location", "Testville"),
        ("occupation", "Engineer"),
    ]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn login(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": email, "password": "hunter22" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"].as_str().unwrap().to_string()
}

async fn create_post(app: &Router, token: &str, description: &str) -> Value {
    let (content_type, body) = multipart(&[("description", description)]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/posts")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn send(app: &Router, request: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn like_scenario_notifies_the_owner_exactly_once() {
    let app = test_app();
    let alice = register(&app, "Alice", "alice@example.com").await;
    let bob = register(&app, "Bob", "bob@example.com").await;
    let alice_id = alice["id"].as_str().unwrap();
    let bob_id = bob["id"].as_str().unwrap().to_string();

    let alice_token = login(&app, "alice@example.com").await;
    let bob_token = login(&app, "bob@example.com").await;

    let post = create_post(&app, &alice_token, "hello").await;
    let post_id = post["id"].as_str().unwrap();

    // First like: recorded, and Alice gets one `like` notification.
    let response = send(
        &app,
        authed("PATCH", &format!("/posts/{post_id}/like"), &bob_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let liked = body_json(response).await;
    assert_eq!(liked["likes"][&bob_id], json!(true));

    let response = send(
        &app,
        authed("GET", &format!("/users/{alice_id}/notifications"), &alice_token),
    )
    .await;
    let notifications = body_json(response).await;
    assert_eq!(notifications.as_array().unwrap().len(), 1);
    assert_eq!(notifications[0]["type"], json!("like"));
    assert_eq!(notifications[0]["relatedId"].as_str().unwrap(), post_id);

    // Second like: toggled off, no new notification.
    let response = send(
        &app,
        authed("PATCH", &format!("/posts/{post_id}/like"), &bob_token),
    )
    .await;
    let unliked = body_json(response).await;
    assert!(!unliked["likes"].as_object().unwrap().contains_key(&bob_id));

    let response = send(
        &app,
        authed("GET", &format!("/users/{alice_id}/notifications"), &alice_token),
    )
    .await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn friendship_scenario_is_symmetric_and_notifies() {
    let app = test_app();
    let alice = register(&app, "Alice", "alice@example.com").await;
    let bob = register(&app, "Bob", "bob@example.com").await;
    let alice_id = alice["id"].as_str().unwrap();
    let bob_id = bob["id"].as_str().unwrap();
    let alice_token = login(&app, "alice@example.com").await;
    let bob_token = login(&app, "bob@example.com").await;

    let response = send(
        &app,
        authed("PATCH", &format!("/users/{alice_id}/{bob_id}"), &alice_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let friends = body_json(response).await;
    assert_eq!(friends[0]["id"].as_str().unwrap(), bob_id);

    let response = send(
        &app,
        authed("GET", &format!("/users/{bob_id}/friends"), &bob_token),
    )
    .await;
    let bobs_friends = body_json(response).await;
    assert_eq!(bobs_friends[0]["id"].as_str().unwrap(), alice_id);

    let response = send(
        &app,
        authed("GET", &format!("/users/{bob_id}/notifications"), &bob_token),
    )
    .await;
    let notifications = body_json(response).await;
    assert_eq!(notifications.as_array().unwrap().len(), 1);
    assert_eq!(notifications[0]["type"], json!("friend"));
}

#[tokio::test]
async fn friend_toggles_require_the_list_owner() {
    let app = test_app();
    let alice = register(&app, "Alice", "alice@example.com").await;
    let bob = register(&app, "Bob", "bob@example.com").await;
    let alice_id = alice["id"].as_str().unwrap();
    let bob_id = bob["id"].as_str().unwrap();
    let bob_token = login(&app, "bob@example.com").await;

    // Bob may not rewrite Alice's friend list.
    let response = send(
        &app,
        authed("PATCH", &format!("/users/{alice_id}/{bob_id}"), &bob_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        authed("GET", &format!("/users/{bob_id}/friends"), &bob_token),
    )
    .await;
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn whitespace_only_names_are_rejected() {
    let app = test_app();
    let (content_type, body) = multipart(&[
        ("firstName", "   "),
        ("lastName", "Tester"),
        ("email", "blank@example.com"),
        ("password", "hunter22"),
    ]);
    let response = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/auth/register")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bearer_token_is_required() {
    let app = test_app();

    let response = send(
        &app,
        Request::builder().uri("/posts").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, authed("GET", "/posts", "not-a-real-token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app();
    register(&app, "Alice", "alice@example.com").await;

    let (content_type, body) = multipart(&[
        ("firstName", "Other"),
        ("lastName", "Alice"),
        ("email", "alice@example.com"),
        ("password", "hunter22"),
    ]);
    let response = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/auth/register")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn search_returns_only_matching_posts() {
    let app = test_app();
    register(&app, "Alice", "alice@example.com").await;
    let token = login(&app, "alice@example.com").await;
    create_post(&app, &token, "red car").await;
    create_post(&app, &token, "blue bike").await;

    let response = send(
        &app,
        Request::builder()
            .uri("/search?query=car")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let results = body_json(response).await;
    let posts = results["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["description"], json!("red car"));

    let response = send(
        &app,
        Request::builder().uri("/search").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_owner_may_delete_a_post() {
    let app = test_app();
    register(&app, "Alice", "alice@example.com").await;
    register(&app, "Bob", "bob@example.com").await;
    let alice_token = login(&app, "alice@example.com").await;
    let bob_token = login(&app, "bob@example.com").await;

    let post = create_post(&app, &alice_token, "hello").await;
    let post_id = post["id"].as_str().unwrap();

    let response = send(
        &app,
        authed("DELETE", &format!("/posts/{post_id}"), &bob_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        authed("DELETE", &format!("/posts/{post_id}"), &alice_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, authed("GET", "/posts", &alice_token)).await;
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn blank_comments_are_rejected_at_the_boundary() {
    let app = test_app();
    register(&app, "Alice", "alice@example.com").await;
    let token = login(&app, "alice@example.com").await;
    let post = create_post(&app, &token, "hello").await;
    let post_id = post["id"].as_str().unwrap();

    let response = send(
        &app,
        Request::builder()
            .method("PATCH")
            .uri(format!("/posts/{post_id}/comment"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "comment": "   " }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
