use axum::{debug_handler, extract::{Query, State}, response::Html};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{activity, auth::Actor, db::Room, include_res, res, topics, AppResult};

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub(crate) fn room_item(room: &Room) -> String {
    let host = match (room.host_id, &room.host_username) {
        (Some(id), Some(username)) => format!(r#"<a href="/user-profile/{id}">@{}</a>"#, res::esc(username)),
        _ => "nobody".to_owned(),
    };

    include_res!(str, "/pages/room_item.html")
        .replace("{id}", &room.id.to_string())
        .replace("{host}", &host)
        .replace("{topic}", &res::esc(room.topic_name.as_deref().unwrap_or("")))
        .replace("{updated}", &res::time(&room.updated))
        .replace("{name}", &res::esc(&room.name))
}

#[debug_handler(state = crate::AppState)]
pub async fn home(
    State(db_pool): State<SqlitePool>,
    Actor(actor): Actor,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Html<String>> {
    let home = activity::home(&db_pool, &q).await?;

    let room_items: String = home.rooms.iter().map(room_item).collect();
    let body = include_res!(str, "/pages/index.html")
        .replace("{q}", &res::attr(&q))
        .replace("{topics}", &topics::topic_links(&home.topics))
        .replace("{room_count}", &home.room_count.to_string())
        .replace("{room_items}", &room_items)
        .replace("{messages}", &activity::message_list(actor.as_ref(), &home.messages));

    Ok(res::layout(actor.as_ref(), "Home", &body))
}
