use axum::{debug_handler, extract::State, response::{IntoResponse, Redirect, Response}, Form};
use sqlx::SqlitePool;

use crate::{
    auth::AuthUser,
    db::rooms::{self, RoomFields},
    error::Error,
    AppResult,
};

use super::form::{render_form, RoomForm};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_room_page(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> AppResult<Response> {
    Ok(render_form(&db_pool, &user, "/create-room", None, None).await?.into_response())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_room(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Form(form): Form<RoomForm>,
) -> AppResult<Response> {
    let fields = RoomFields::from(form);

    match rooms::create(&db_pool, &user, fields.clone()).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(Error::ValidationFailed(error)) => {
            Ok(render_form(&db_pool, &user, "/create-room", Some(&fields), Some(&error)).await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}
