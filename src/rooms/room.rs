use axum::{debug_handler, extract::{Path, State}, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    activity,
    auth::{login_url, Actor, AuthUser},
    db::{messages, rooms, User},
    error::Error,
    include_res, res, AppResult,
};

#[derive(Deserialize)]
pub(crate) struct SendMessageForm {
    body: String,
}

/// `error` is shown above the composer.
async fn render_room(
    db_pool: &SqlitePool,
    actor: Option<&User>,
    room_id: Uuid,
    error: Option<&str>,
) -> AppResult<Html<String>> {
    let room = rooms::get(db_pool, room_id).await?;
    let msgs = messages::list(db_pool, room_id).await?;
    let participants = rooms::participants(db_pool, room_id).await?;

    let participant_items: String = participants
        .iter()
        .map(|p| format!(r#"<li><a href="/user-profile/{}">@{}</a></li>"#, p.id, res::esc(&p.username)))
        .collect();

    let is_host = actor.is_some_and(|a| Some(a.id) == room.host_id);
    let host_actions = if is_host {
        format!(r#"<a href="/update-room/{room_id}">Edit</a> <a href="/delete-room/{room_id}">Delete</a>"#)
    } else {
        String::new()
    };
    let composer = if actor.is_some() {
        include_res!(str, "/pages/composer.html")
            .replace("{error}", &res::error_block(error))
            .replace("{room_id}", &room_id.to_string())
    } else {
        format!(
            r#"<p><a href="{}">Log in</a> to join the conversation.</p>"#,
            res::attr(&login_url(&format!("/room/{room_id}")))
        )
    };

    let body = include_res!(str, "/pages/room.html")
        .replace("{host_actions}", &host_actions)
        .replace("{composer}", &composer)
        .replace("{room_item}", &crate::index::room_item(&room))
        .replace("{description}", &res::esc(room.description.as_deref().unwrap_or("")))
        .replace("{participant_count}", &participants.len().to_string())
        .replace("{participants}", &participant_items)
        .replace("{messages}", &activity::message_list(actor, &msgs));

    Ok(res::layout(actor, &room.name, &body))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn room(
    State(db_pool): State<SqlitePool>,
    Actor(actor): Actor,
    Path(room_id): Path<Uuid>,
) -> AppResult<Html<String>> {
    render_room(&db_pool, actor.as_ref(), room_id, None).await
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn post_message(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<Uuid>,
    Form(SendMessageForm { body }): Form<SendMessageForm>,
) -> AppResult<Response> {
    match messages::post(&db_pool, &user, room_id, &body).await {
        Ok(_) => Ok(Redirect::to(&format!("/room/{room_id}")).into_response()),
        Err(Error::ValidationFailed(error)) => {
            Ok(render_room(&db_pool, Some(&user), room_id, Some(&error)).await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}
