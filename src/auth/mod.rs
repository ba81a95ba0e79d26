//! Identity boundary: who is making this request, and the session plumbing
//! for signing in and out.

mod login;
mod logout;
pub mod password;
mod register;

pub(crate) use register::valid_username;

use anyhow::anyhow;
use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    db::{users, User},
    res,
    session::USER_ID,
    AppError, AppResult, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(logout::logout))
        .route("/register", get(register::register_page).post(register::register))
}

/// `Some` when the email exists and the password matches its stored hash.
pub async fn authenticate(db_pool: &SqlitePool, email: &str, password: &str) -> AppResult<Option<User>> {
    let Some(user) = users::by_email(db_pool, email).await? else {
        return Ok(None);
    };
    let matches = password::verify_blocking(password.to_owned(), user.password_hash.clone()).await?;
    Ok(matches.then_some(user))
}

pub async fn current_user(db_pool: &SqlitePool, session: &Session) -> AppResult<Option<User>> {
    let Some(user_id) = session.get::<Uuid>(USER_ID).await? else {
        return Ok(None);
    };
    Ok(users::find(db_pool, user_id).await?)
}

/// Issues a fresh session id before binding it to `user`.
pub async fn login(session: &Session, user: &User) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(USER_ID, user.id).await?;
    tracing::info!(user_id = %user.id, "signed in");
    Ok(())
}

pub async fn logout(session: &Session) {
    session.clear().await;
}

/// The signed-in user for this request, if any.
pub struct Actor(pub Option<User>);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| anyhow!(msg))?;
        let db_pool = SqlitePool::from_ref(state);

        Ok(Actor(current_user(&db_pool, &session).await?))
    }
}

/// Like [`Actor`], but anonymous requests are sent to the login page and
/// come back here afterwards.
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Actor(user) = Actor::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match user {
            Some(user) => Ok(AuthUser(user)),
            None => {
                let path = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|uri| uri.path().to_owned())
                    .unwrap_or_else(|| parts.uri.path().to_owned());
                Err(Redirect::to(&login_url(&path)).into_response())
            }
        }
    }
}

/// The login page, set to come back to `return_url` afterwards.
pub(crate) fn login_url(return_url: &str) -> String {
    format!("/login?return_url={}", res::url_component(return_url))
}

/// Only same-site paths are followed after login. Browsers read `/\host` as
/// `//host`, and control characters cannot go into a `Location` header.
pub(crate) fn safe_return_url(return_url: Option<String>) -> String {
    return_url
        .filter(|url| {
            url.starts_with('/')
                && !url.starts_with("//")
                && !url.contains('\\')
                && !url.chars().any(|c| c.is_ascii_control())
        })
        .unwrap_or_else(|| "/".to_owned())
}
