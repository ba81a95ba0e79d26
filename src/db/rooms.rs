use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    access,
    error::{Error, Result},
    search,
};

use super::{topics, User};

const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Clone, FromRow)]
pub struct Room {
    pub id: Uuid,
    /// `None` once the host account is gone
    pub host_id: Option<Uuid>,
    pub host_username: Option<String>,
    pub topic_id: Option<Uuid>,
    pub topic_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

/// What the room form submits.
#[derive(Debug, Clone)]
pub struct RoomFields {
    pub topic: String,
    pub name: String,
    pub description: Option<String>,
}

impl RoomFields {
    fn validate(&self) -> Result<()> {
        let len_ok = |s: &str| !s.trim().is_empty() && s.chars().count() <= MAX_NAME_LEN;
        if !len_ok(&self.name) {
            return Err(Error::ValidationFailed(format!("Room name must be 1 to {MAX_NAME_LEN} characters.")));
        }
        if !len_ok(&self.topic) {
            return Err(Error::ValidationFailed(format!("Topic must be 1 to {MAX_NAME_LEN} characters.")));
        }
        Ok(())
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.trim().is_empty())
    }
}

const SELECT: &str = r#"
    SELECT r.id, r.host_id, u.username AS host_username, r.topic_id, t.name AS topic_name,
           r.name, r.description, r.updated, r.created
    FROM rooms r
    LEFT JOIN users u ON u.id = r.host_id
    LEFT JOIN topics t ON t.id = r.topic_id
"#;

const ORDER: &str = "ORDER BY r.updated DESC, r.created DESC";

/// Rooms whose topic, name or description contains `query`, most recently
/// updated first.
pub async fn list(db_pool: &SqlitePool, query: &str) -> Result<Vec<Room>> {
    let rooms: Vec<Room> = sqlx::query_as(&format!("{SELECT} {ORDER}"))
        .fetch_all(db_pool)
        .await?;

    Ok(rooms
        .into_iter()
        .filter(|r| search::matches(query, [r.topic_name.as_deref(), Some(r.name.as_str()), r.description.as_deref()]))
        .collect())
}

pub async fn hosted_by(db_pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Room>> {
    Ok(sqlx::query_as(&format!("{SELECT} WHERE r.host_id=? {ORDER}"))
        .bind(user_id)
        .fetch_all(db_pool)
        .await?)
}

async fn find(conn: &mut SqliteConnection, id: Uuid) -> Result<Room> {
    sqlx::query_as(&format!("{SELECT} WHERE r.id=?"))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(Error::NotFound("room"))
}

pub async fn get(db_pool: &SqlitePool, id: Uuid) -> Result<Room> {
    find(&mut *db_pool.acquire().await?, id).await
}

/// Participants in the order they joined.
pub async fn participants(db_pool: &SqlitePool, room_id: Uuid) -> Result<Vec<User>> {
    Ok(sqlx::query_as(
        r#"SELECT u.id,u.email,u.username,u.name,u.bio,u.avatar,u.password_hash,u.created
        FROM participants p JOIN users u ON u.id = p.user_id
        WHERE p.room_id=? ORDER BY p.joined, p.rowid"#,
    )
    .bind(room_id)
    .fetch_all(db_pool)
    .await?)
}

/// Idempotent: joining twice keeps a single membership row.
pub(crate) async fn add_participant(conn: &mut SqliteConnection, room_id: Uuid, user_id: Uuid) -> Result<bool> {
    let added = sqlx::query("INSERT INTO participants (room_id,user_id,joined) VALUES (?,?,?) ON CONFLICT DO NOTHING")
        .bind(room_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(conn)
        .await?
        .rows_affected()
        == 1;
    Ok(added)
}

/// The actor becomes host. Hosts are not participants until they post.
pub async fn create(db_pool: &SqlitePool, actor: &User, fields: RoomFields) -> Result<Room> {
    fields.validate()?;
    let mut tx = db_pool.begin().await?;

    let (topic, _) = topics::get_or_create(&mut tx, &fields.topic).await?;
    let now = Utc::now();
    let room = Room {
        id: Uuid::now_v7(),
        host_id: Some(actor.id),
        host_username: Some(actor.username.clone()),
        topic_id: Some(topic.id),
        topic_name: Some(topic.name),
        name: fields.name.clone(),
        description: fields.description().map(str::to_owned),
        updated: now,
        created: now,
    };

    sqlx::query("INSERT INTO rooms (id,host_id,topic_id,name,description,updated,created) VALUES (?,?,?,?,?,?,?)")
        .bind(room.id)
        .bind(room.host_id)
        .bind(room.topic_id)
        .bind(&room.name)
        .bind(&room.description)
        .bind(room.updated)
        .bind(room.created)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(room_id = %room.id, host = %actor.id, "room created");
    Ok(room)
}

/// Host-only. Rewrites topic, name and description and bumps `updated`.
pub async fn update(db_pool: &SqlitePool, actor: &User, id: Uuid, fields: RoomFields) -> Result<Room> {
    let mut tx = db_pool.begin().await?;

    let room = find(&mut tx, id).await?;
    access::ensure_owner(actor, room.host_id, access::UPDATE_ROOM)?;
    fields.validate()?;

    let (topic, _) = topics::get_or_create(&mut tx, &fields.topic).await?;
    sqlx::query("UPDATE rooms SET topic_id=?, name=?, description=?, updated=? WHERE id=?")
        .bind(topic.id)
        .bind(&fields.name)
        .bind(fields.description())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let room = find(&mut tx, id).await?;
    tx.commit().await?;
    tracing::info!(room_id = %id, "room updated");
    Ok(room)
}

/// Host-only. Takes the room's messages and memberships with it.
pub async fn delete(db_pool: &SqlitePool, actor: &User, id: Uuid) -> Result<()> {
    let mut tx = db_pool.begin().await?;

    let room = find(&mut tx, id).await?;
    access::ensure_owner(actor, room.host_id, access::DELETE_ROOM)?;

    let messages = sqlx::query("DELETE FROM messages WHERE room_id=?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM participants WHERE room_id=?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM rooms WHERE id=?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(room_id = %id, messages, "room deleted");
    Ok(())
}
