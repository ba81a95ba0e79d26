use axum::{debug_handler, extract::{Path, State}, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    access,
    auth::AuthUser,
    db::{rooms::{self, RoomFields}, topics, User},
    error::Error,
    include_res, res, AppResult,
};

#[derive(Debug, Deserialize)]
pub(crate) struct RoomForm {
    topic: String,
    name: String,
    #[serde(default)]
    description: String,
}

impl From<RoomForm> for RoomFields {
    fn from(RoomForm { topic, name, description }: RoomForm) -> Self {
        RoomFields {
            topic: topic.trim().to_owned(),
            name: name.trim().to_owned(),
            description: res::non_empty(description),
        }
    }
}

/// The create and update pages share one form; `action` is where it posts.
pub(crate) async fn render_form(
    db_pool: &SqlitePool,
    actor: &User,
    action: &str,
    fields: Option<&RoomFields>,
    error: Option<&str>,
) -> AppResult<Html<String>> {
    let topic_options: String = topics::list(db_pool, "")
        .await?
        .iter()
        .map(|t| format!(r#"<option value="{}"></option>"#, res::attr(&t.name)))
        .collect();

    let (topic, name, description) = match fields {
        Some(f) => (f.topic.as_str(), f.name.as_str(), f.description.as_deref().unwrap_or("")),
        None => ("", "", ""),
    };

    let body = include_res!(str, "/pages/room_form.html")
        .replace("{action}", action)
        .replace("{error}", &res::error_block(error))
        .replace("{topic_options}", &topic_options)
        .replace("{topic}", &res::attr(topic))
        .replace("{name}", &res::attr(name))
        .replace("{description}", &res::esc(description));

    Ok(res::layout(Some(actor), "Room", &body))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_room_page(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let room = rooms::get(&db_pool, id).await?;
    access::ensure_owner(&user, room.host_id, access::UPDATE_ROOM)?;

    let fields = RoomFields {
        topic: room.topic_name.unwrap_or_default(),
        name: room.name,
        description: room.description,
    };
    let action = format!("/update-room/{id}");
    Ok(render_form(&db_pool, &user, &action, Some(&fields), None).await?.into_response())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_room(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Form(form): Form<RoomForm>,
) -> AppResult<Response> {
    let fields = RoomFields::from(form);

    match rooms::update(&db_pool, &user, id, fields.clone()).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(Error::ValidationFailed(error)) => {
            let action = format!("/update-room/{id}");
            Ok(render_form(&db_pool, &user, &action, Some(&fields), Some(&error)).await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}
