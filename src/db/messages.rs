use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    access,
    error::{Error, Result},
    search,
};

use super::{rooms, User};

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub avatar: String,
    pub room_id: Uuid,
    pub room_name: String,
    pub topic_name: Option<String>,
    pub body: String,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

const SELECT: &str = r#"
    SELECT m.id, m.user_id, u.username, u.avatar, m.room_id, r.name AS room_name,
           t.name AS topic_name, m.body, m.updated, m.created
    FROM messages m
    JOIN users u ON u.id = m.user_id
    JOIN rooms r ON r.id = m.room_id
    LEFT JOIN topics t ON t.id = r.topic_id
"#;

const ORDER: &str = "ORDER BY m.updated DESC, m.created DESC";

pub async fn list(db_pool: &SqlitePool, room_id: Uuid) -> Result<Vec<Message>> {
    Ok(sqlx::query_as(&format!("{SELECT} WHERE m.room_id=? {ORDER}"))
        .bind(room_id)
        .fetch_all(db_pool)
        .await?)
}

pub async fn by_user(db_pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Message>> {
    Ok(sqlx::query_as(&format!("{SELECT} WHERE m.user_id=? {ORDER}"))
        .bind(user_id)
        .fetch_all(db_pool)
        .await?)
}

/// Messages in rooms whose topic name contains `query`. Rooms without a
/// topic contribute nothing, even to the empty query.
pub async fn by_topic(db_pool: &SqlitePool, query: &str) -> Result<Vec<Message>> {
    let messages: Vec<Message> = sqlx::query_as(&format!("{SELECT} WHERE r.topic_id IS NOT NULL {ORDER}"))
        .fetch_all(db_pool)
        .await?;

    Ok(messages
        .into_iter()
        .filter(|m| search::matches(query, [m.topic_name.as_deref()]))
        .collect())
}

pub async fn recent(db_pool: &SqlitePool, limit: i64) -> Result<Vec<Message>> {
    Ok(sqlx::query_as(&format!("{SELECT} {ORDER} LIMIT ?"))
        .bind(limit)
        .fetch_all(db_pool)
        .await?)
}

pub async fn get(db_pool: &SqlitePool, id: Uuid) -> Result<Message> {
    sqlx::query_as(&format!("{SELECT} WHERE m.id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(Error::NotFound("message"))
}

pub const EMPTY_BODY: &str = "Message cannot be empty.";

/// Any signed-in user may post; posting makes them a participant.
pub async fn post(db_pool: &SqlitePool, actor: &User, room_id: Uuid, body: &str) -> Result<Message> {
    if body.trim().is_empty() {
        return Err(Error::ValidationFailed(EMPTY_BODY.to_owned()));
    }
    let mut tx = db_pool.begin().await?;

    let (room_name, topic_name): (String, Option<String>) = sqlx::query_as(
        "SELECT r.name, t.name FROM rooms r LEFT JOIN topics t ON t.id = r.topic_id WHERE r.id=?",
    )
    .bind(room_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(Error::NotFound("room"))?;

    let now = Utc::now();
    let message = Message {
        id: Uuid::now_v7(),
        user_id: actor.id,
        username: actor.username.clone(),
        avatar: actor.avatar.clone(),
        room_id,
        room_name,
        topic_name,
        body: body.to_owned(),
        updated: now,
        created: now,
    };

    sqlx::query("INSERT INTO messages (id,user_id,room_id,body,updated,created) VALUES (?,?,?,?,?,?)")
        .bind(message.id)
        .bind(message.user_id)
        .bind(message.room_id)
        .bind(&message.body)
        .bind(message.updated)
        .bind(message.created)
        .execute(&mut *tx)
        .await?;
    let joined = rooms::add_participant(&mut tx, room_id, actor.id).await?;

    tx.commit().await?;
    tracing::info!(message_id = %message.id, %room_id, user_id = %actor.id, joined, "message posted");
    Ok(message)
}

/// Author-only. Room membership is left as it was.
pub async fn delete(db_pool: &SqlitePool, actor: &User, id: Uuid) -> Result<()> {
    let mut tx = db_pool.begin().await?;

    let (author,): (Uuid,) = sqlx::query_as("SELECT user_id FROM messages WHERE id=?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::NotFound("message"))?;
    access::ensure_owner(actor, Some(author), access::DELETE_MESSAGE)?;

    sqlx::query("DELETE FROM messages WHERE id=?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(message_id = %id, "message deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        fixtures, memory,
        rooms::{self, RoomFields},
    };

    async fn room(db_pool: &SqlitePool, host: &User, topic: &str) -> rooms::Room {
        rooms::create(db_pool, host, RoomFields {
            topic: topic.to_owned(),
            name: format!("{topic} room"),
            description: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn posting_joins_the_room_once() {
        let db_pool = memory().await;
        let ada = fixtures::user(&db_pool, "ada").await;
        let bob = fixtures::user(&db_pool, "bob").await;
        let room = room(&db_pool, &ada, "Math").await;

        post(&db_pool, &bob, room.id, "hi").await.unwrap();
        post(&db_pool, &bob, room.id, "again").await.unwrap();

        let participants = rooms::participants(&db_pool, room.id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].id, bob.id);
    }

    #[tokio::test]
    async fn newest_message_comes_first() {
        let db_pool = memory().await;
        let ada = fixtures::user(&db_pool, "ada").await;
        let room = room(&db_pool, &ada, "Math").await;

        post(&db_pool, &ada, room.id, "first").await.unwrap();
        post(&db_pool, &ada, room.id, "second").await.unwrap();

        let bodies: Vec<String> = list(&db_pool, room.id).await.unwrap().into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, ["second", "first"]);
    }

    #[tokio::test]
    async fn blank_body_is_rejected_without_joining() {
        let db_pool = memory().await;
        let ada = fixtures::user(&db_pool, "ada").await;
        let bob = fixtures::user(&db_pool, "bob").await;
        let room = room(&db_pool, &ada, "Math").await;

        let err = post(&db_pool, &bob, room.id, " \n\t").await.unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(ref msg) if msg == EMPTY_BODY));
        assert!(list(&db_pool, room.id).await.unwrap().is_empty());
        assert!(rooms::participants(&db_pool, room.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn posting_into_a_missing_room_fails() {
        let db_pool = memory().await;
        let ada = fixtures::user(&db_pool, "ada").await;

        let err = post(&db_pool, &ada, Uuid::now_v7(), "hello?").await.unwrap_err();
        assert!(matches!(err, Error::NotFound("room")));
    }

    #[tokio::test]
    async fn only_the_author_deletes() {
        let db_pool = memory().await;
        let ada = fixtures::user(&db_pool, "ada").await;
        let bob = fixtures::user(&db_pool, "bob").await;
        let room = room(&db_pool, &ada, "Math").await;
        let message = post(&db_pool, &bob, room.id, "mine").await.unwrap();

        // not even the host
        let err = delete(&db_pool, &ada, message.id).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(access::DELETE_MESSAGE)));
        assert!(get(&db_pool, message.id).await.is_ok());

        delete(&db_pool, &bob, message.id).await.unwrap();
        assert!(matches!(get(&db_pool, message.id).await, Err(Error::NotFound("message"))));
        assert_eq!(rooms::participants(&db_pool, room.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn topic_feed_matches_topic_name_only() {
        let db_pool = memory().await;
        let ada = fixtures::user(&db_pool, "ada").await;
        let math = room(&db_pool, &ada, "Math").await;
        let bio = room(&db_pool, &ada, "Biology").await;
        post(&db_pool, &ada, math.id, "algebra").await.unwrap();
        post(&db_pool, &ada, bio.id, "cells").await.unwrap();

        assert_eq!(by_topic(&db_pool, "").await.unwrap().len(), 2);
        let math_feed = by_topic(&db_pool, "MATH").await.unwrap();
        assert_eq!(math_feed.len(), 1);
        assert_eq!(math_feed[0].body, "algebra");
        // room names are not part of the feed filter
        assert!(by_topic(&db_pool, "room").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_is_capped() {
        let db_pool = memory().await;
        let ada = fixtures::user(&db_pool, "ada").await;
        let room = room(&db_pool, &ada, "Math").await;
        for n in 0..7 {
            post(&db_pool, &ada, room.id, &n.to_string()).await.unwrap();
        }

        let bodies: Vec<String> = recent(&db_pool, 5).await.unwrap().into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, ["6", "5", "4", "3", "2"]);
    }
}
