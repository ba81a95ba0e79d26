//! Read-side aggregation for the home page and the activity feed.

use axum::{debug_handler, extract::State, response::Html};
use sqlx::SqlitePool;

use crate::{
    auth::Actor,
    db::{messages, rooms, topics, Message, Room, Topic},
    error::Result,
    include_res, res, AppResult,
};

pub const HOME_TOPICS: usize = 5;
pub const RECENT_MESSAGES: i64 = 5;

pub struct Home {
    pub rooms: Vec<Room>,
    pub topics: Vec<Topic>,
    pub room_count: usize,
    /// Filtered by topic name on its own, not by the room list above
    pub messages: Vec<Message>,
}

pub async fn home(db_pool: &SqlitePool, query: &str) -> Result<Home> {
    let rooms = rooms::list(db_pool, query).await?;
    let mut topics = topics::list(db_pool, "").await?;
    topics.truncate(HOME_TOPICS);
    let messages = messages::by_topic(db_pool, query).await?;

    Ok(Home {
        room_count: rooms.len(),
        rooms,
        topics,
        messages,
    })
}

pub async fn recent_activity(db_pool: &SqlitePool) -> Result<Vec<Message>> {
    messages::recent(db_pool, RECENT_MESSAGES).await
}

/// One feed entry; the delete link only shows for the author.
pub fn message_item(actor: Option<&crate::db::User>, message: &Message) -> String {
    let delete = match actor {
        Some(user) if user.id == message.user_id => {
            format!(r#"<a href="/delete-message/{}">Delete</a>"#, message.id)
        }
        _ => String::new(),
    };

    include_res!(str, "/pages/message.html")
        .replace("{user_id}", &message.user_id.to_string())
        .replace("{username}", &res::esc(&message.username))
        .replace("{avatar}", &res::attr(&message.avatar))
        .replace("{room_id}", &message.room_id.to_string())
        .replace("{room_name}", &res::esc(&message.room_name))
        .replace("{created}", &res::time(&message.created))
        .replace("{delete}", &delete)
        .replace("{body}", &res::markdown(&message.body))
}

pub fn message_list(actor: Option<&crate::db::User>, messages: &[Message]) -> String {
    if messages.is_empty() {
        return "<p>No messages yet.</p>".to_owned();
    }
    messages.iter().map(|m| message_item(actor, m)).collect()
}

#[debug_handler(state = crate::AppState)]
pub async fn activities(
    State(db_pool): State<SqlitePool>,
    Actor(actor): Actor,
) -> AppResult<Html<String>> {
    let messages = recent_activity(&db_pool).await?;

    let body = include_res!(str, "/pages/activity.html")
        .replace("{messages}", &message_list(actor.as_ref(), &messages));
    Ok(res::layout(actor.as_ref(), "Recent activity", &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fixtures, memory, rooms::RoomFields};

    #[tokio::test]
    async fn home_composes_filtered_views() {
        let db_pool = memory().await;
        let ada = fixtures::user(&db_pool, "ada").await;

        let mut math_room = None;
        for (topic, name) in [("Math", "Algebra"), ("Biology", "Math of cells"), ("Art", "Drawing"), ("Music", "Scales"), ("Chess", "Openings"), ("Go", "Joseki")] {
            let room = rooms::create(&db_pool, &ada, RoomFields {
                topic: topic.to_owned(),
                name: name.to_owned(),
                description: None,
            })
            .await
            .unwrap();
            messages::post(&db_pool, &ada, room.id, &format!("about {name}")).await.unwrap();
            if topic == "Math" {
                math_room = Some(room);
            }
        }

        let all = home(&db_pool, "").await.unwrap();
        assert_eq!(all.room_count, 6);
        assert_eq!(all.topics.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(), ["Math", "Biology", "Art", "Music", "Chess"]);
        assert_eq!(all.messages.len(), 6);

        let math = home(&db_pool, "math").await.unwrap();
        // the room arm matches a room name; the message arm only topics
        assert_eq!(math.room_count, 2);
        assert_eq!(math.messages.len(), 1);
        assert_eq!(math.messages[0].room_id, math_room.unwrap().id);
        assert_eq!(math.topics.len(), HOME_TOPICS);
    }

    #[tokio::test]
    async fn recent_activity_spans_rooms() {
        let db_pool = memory().await;
        let ada = fixtures::user(&db_pool, "ada").await;
        let mut ids = Vec::new();
        for topic in ["A", "B", "C"] {
            let room = rooms::create(&db_pool, &ada, RoomFields {
                topic: topic.to_owned(),
                name: topic.to_owned(),
                description: None,
            })
            .await
            .unwrap();
            for n in 0..2 {
                ids.push(messages::post(&db_pool, &ada, room.id, &format!("{topic}{n}")).await.unwrap().id);
            }
        }

        let recent = recent_activity(&db_pool).await.unwrap();
        let expected: Vec<_> = ids.iter().rev().take(5).copied().collect();
        assert_eq!(recent.iter().map(|m| m.id).collect::<Vec<_>>(), expected);
    }
}
