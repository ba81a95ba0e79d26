use axum::{debug_handler, extract::{Query, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db::users, include_res, res, session, AppResult};

use super::{login_url, safe_return_url, Actor};

pub(crate) const USER_NOT_FOUND: &str = "User not found.";
pub(crate) const BAD_CREDENTIALS: &str = "Username or password incorrect.";

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    email: String,
    password: String,
}

fn render(actor: Option<&users::User>, return_url: &str, error: Option<&str>) -> Response {
    let body = include_res!(str, "/pages/login.html")
        .replace("{return_url}", &res::attr(&res::url_component(return_url)))
        .replace("{error}", &res::error_block(error));
    res::layout(actor, "Login", &body).into_response()
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login_page(
    Actor(actor): Actor,
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    session: Session,
) -> AppResult<Response> {
    if actor.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let flash = session::take_flash(&session).await?;
    Ok(render(None, &safe_return_url(return_url), flash.as_deref()))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    Actor(actor): Actor,
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    session: Session,
    Form(LoginForm { email, password }): Form<LoginForm>,
) -> AppResult<Response> {
    if actor.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let email = email.trim().to_lowercase();
    let return_url = safe_return_url(return_url);

    if users::by_email(&db_pool, &email).await?.is_none() {
        session::set_flash(&session, USER_NOT_FOUND).await?;
        return Ok(Redirect::to(&login_url(&return_url)).into_response());
    }

    match super::authenticate(&db_pool, &email, &password).await? {
        Some(user) => {
            super::login(&session, &user).await?;
            Ok(Redirect::to(&return_url).into_response())
        }
        None => Ok(render(None, &return_url, Some(BAD_CREDENTIALS))),
    }
}
