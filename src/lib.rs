//! Social-network backend: users, posts, a symmetric friend graph, and a
//! realtime notification fan-out pipeline.
//!
//! # Infrastructure
//! - Redis holds the documents; relations sit in sets and lists next to them
//!   so toggles commit atomically server-side ([`store`]).
//! - Meilisearch answers `/search` by proxy; index writes ride along domain
//!   mutations and are eventually consistent ([`search`]).
//! - One WebSocket endpoint delivers notifications to whichever channel a
//!   user last joined from ([`realtime`], [`routes::ws`]).
//! - `STANDALONE=1` swaps both backing services for in-memory
//!   implementations; the test suite runs the same way.
//!
//! # Notes
//!
//! ## Durability before delivery
//! Every notification is written to the store before a push is attempted.
//! An offline recipient reads the log on their next visit; a failed push is
//! logged and dropped. The pipeline never retries and never rolls back.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, patch, post},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod friends;
pub mod models;
pub mod notify;
pub mod posts;
pub mod realtime;
pub mod routes;
pub mod search;
pub mod state;
pub mod store;
pub mod uploads;

use routes::{
    auth::{login, register},
    posts::{comment_post, create_post, delete_post, feed, like_post, share_post, user_posts},
    search::search_handler,
    users::{get_friends, get_user, list_notifications, toggle_friend, update_user},
    ws::ws_handler,
};
use state::State;

pub fn router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let assets_dir = state.config.assets_dir.clone();

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/users/{id}", get(get_user).put(update_user))
        .route("/users/{id}/friends", get(get_friends))
        .route("/users/{id}/notifications", get(list_notifications))
        .route("/users/{id}/{friend_id}", patch(toggle_friend))
        .route("/posts", get(feed).post(create_post))
        .route("/posts/{id}", delete(delete_post))
        .route("/posts/{id}/posts", get(user_posts))
        .route("/posts/{id}/like", patch(like_post))
        .route("/posts/{id}/comment", patch(comment_post))
        .route("/posts/{id}/share", patch(share_post))
        .route("/search", get(search_handler))
        .route("/ws", get(ws_handler))
        .nest_service("/assets", ServeDir::new(assets_dir))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await;

    info!("Starting server...");
    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
