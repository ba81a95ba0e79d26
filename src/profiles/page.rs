use axum::{debug_handler, extract::{Path, State}, response::Html};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    activity,
    auth::Actor,
    db::{messages, rooms, topics, users},
    include_res, index, res, topics::topic_links, AppResult,
};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn profile(
    Path(user_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    Actor(actor): Actor,
) -> AppResult<Html<String>> {
    let user = users::get(&db_pool, user_id).await?;
    let hosted = rooms::hosted_by(&db_pool, user_id).await?;
    let msgs = messages::by_user(&db_pool, user_id).await?;
    let topics = topics::list(&db_pool, "").await?;

    let room_items: String = hosted.iter().map(index::room_item).collect();
    let edit = match &actor {
        Some(a) if a.id == user.id => r#"<a href="/update-user">Edit profile</a>"#,
        _ => "",
    };

    let body = include_res!(str, "/pages/profile.html")
        .replace("{edit}", edit)
        .replace("{avatar}", &res::attr(&user.avatar))
        .replace("{handle}", &res::esc(&user.username))
        .replace("{bio}", &res::esc(user.bio.as_deref().unwrap_or("")))
        .replace("{topics}", &topic_links(&topics))
        .replace("{room_items}", &room_items)
        .replace("{messages}", &activity::message_list(actor.as_ref(), &msgs))
        .replace("{alias}", &res::esc(user.display_name()));

    Ok(res::layout(actor.as_ref(), user.display_name(), &body))
}
