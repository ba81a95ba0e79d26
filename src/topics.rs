use axum::{debug_handler, extract::{Query, State}, response::Html};
use sqlx::SqlitePool;

use crate::{auth::Actor, db::{topics, Topic}, include_res, index::SearchQuery, res, AppResult};

/// Each topic links to the home page filtered by it.
pub fn topic_links(topics: &[Topic]) -> String {
    topics
        .iter()
        .map(|t| {
            format!(
                r#"<li><a href="/?q={}">{}</a></li>"#,
                res::attr(&res::url_component(&t.name)),
                res::esc(&t.name)
            )
        })
        .collect()
}

#[debug_handler(state = crate::AppState)]
pub async fn topics_page(
    State(db_pool): State<SqlitePool>,
    Actor(actor): Actor,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Html<String>> {
    let topics = topics::list(&db_pool, &q).await?;

    let body = include_res!(str, "/pages/topics.html")
        .replace("{q}", &res::attr(&q))
        .replace("{topics}", &topic_links(&topics));
    Ok(res::layout(actor.as_ref(), "Browse topics", &body))
}
