use axum::{debug_handler, extract::{Path, State}, response::{Html, Redirect}};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{access, auth::AuthUser, db::{rooms, User}, include_res, res, AppResult};

/// Shared GET confirmation page for room and message deletion.
pub(crate) fn confirm_page(actor: &User, action: &str, what: &str) -> Html<String> {
    let body = include_res!(str, "/pages/delete.html")
        .replace("{action}", action)
        .replace("{what}", &res::esc(what));
    res::layout(Some(actor), "Delete", &body)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_room_page(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let room = rooms::get(&db_pool, id).await?;
    access::ensure_owner(&user, room.host_id, access::DELETE_ROOM)?;

    Ok(confirm_page(&user, &format!("/delete-room/{id}"), &room.name))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_room(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    rooms::delete(&db_pool, &user, id).await?;
    Ok(Redirect::to("/"))
}
