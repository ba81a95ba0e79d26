use axum::{debug_handler, extract::{Path, State}, response::{Html, Redirect}};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{access, auth::AuthUser, db::messages, AppResult};

use super::delete::confirm_page;

/// Short preview used on the confirmation page.
fn preview(body: &str) -> String {
    let head: String = body.chars().take(50).collect();
    if head.len() < body.len() {
        format!("{head}...")
    } else {
        head
    }
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_message_page(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Html<String>> {
    let message = messages::get(&db_pool, id).await?;
    access::ensure_owner(&user, Some(message.user_id), access::DELETE_MESSAGE)?;

    Ok(confirm_page(&user, &format!("/delete-message/{id}"), &preview(&message.body)))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_message(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    messages::delete(&db_pool, &user, id).await?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn long_bodies_are_cut() {
        assert_eq!(preview("short"), "short");
        let long = "x".repeat(60);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(50)));
    }
}
