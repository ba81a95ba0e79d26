pub mod access;
pub mod activity;
pub mod appresult;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod profiles;
pub mod res;
pub mod rooms;
pub mod search;
pub mod session;
pub mod topics;

use axum::{extract::FromRef, routing::get, Router};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

/// The whole HTTP surface, sessions included.
pub fn app(state: AppState, session_idle: time::Duration) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(session_idle));

    Router::new()
        .route("/", get(index::home))
        .route("/topics", get(topics::topics_page))
        .route("/activities", get(activity::activities))

        .merge(auth::router())
        .merge(rooms::router())
        .merge(profiles::router())

        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}
