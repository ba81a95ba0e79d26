use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::{Error, Result};

pub const DEFAULT_AVATAR: &str = "avatar.svg";

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Login identity
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: String,
    pub password_hash: String,
    pub created: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub password_hash: String,
}

/// `None` leaves a field alone; `Some(None)` clears a nullable one.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub avatar: Option<String>,
    pub name: Option<Option<String>>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<Option<String>>,
}

const SELECT: &str = "SELECT id,email,username,name,bio,avatar,password_hash,created FROM users";

pub async fn insert(db_pool: &SqlitePool, new: NewUser) -> Result<User> {
    let user = User {
        id: Uuid::now_v7(),
        email: new.email,
        username: new.username,
        name: new.name,
        bio: new.bio,
        avatar: DEFAULT_AVATAR.to_owned(),
        password_hash: new.password_hash,
        created: Utc::now(),
    };

    sqlx::query("INSERT INTO users (id,email,username,name,bio,avatar,password_hash,created) VALUES (?,?,?,?,?,?,?,?)")
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.bio)
        .bind(&user.avatar)
        .bind(&user.password_hash)
        .bind(user.created)
        .execute(db_pool)
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

pub async fn find(db_pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    Ok(sqlx::query_as(&format!("{SELECT} WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?)
}

pub async fn get(db_pool: &SqlitePool, id: Uuid) -> Result<User> {
    find(db_pool, id).await?.ok_or(Error::NotFound("user"))
}

pub async fn by_email(db_pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    Ok(sqlx::query_as(&format!("{SELECT} WHERE email=?"))
        .bind(email)
        .fetch_optional(db_pool)
        .await?)
}

/// Applies `update` to the actor's own row. The actor is the only target;
/// there is no way to name another user.
pub async fn update_profile(db_pool: &SqlitePool, actor: &User, update: ProfileUpdate) -> Result<User> {
    let mut tx = db_pool.begin().await?;

    let current: User = sqlx::query_as(&format!("{SELECT} WHERE id=?"))
        .bind(actor.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::NotFound("user"))?;

    let user = User {
        avatar: update.avatar.unwrap_or(current.avatar),
        name: update.name.unwrap_or(current.name),
        username: update.username.unwrap_or(current.username),
        email: update.email.unwrap_or(current.email),
        bio: update.bio.unwrap_or(current.bio),
        ..current
    };

    let result = sqlx::query("UPDATE users SET avatar=?,name=?,username=?,email=?,bio=? WHERE id=?")
        .bind(&user.avatar)
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.bio)
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .map_err(Error::from);

    if let Err(e) = result {
        if e.is_unique_violation() {
            return Err(Error::ValidationFailed("That username or email is already taken.".to_owned()));
        }
        return Err(e);
    }

    tx.commit().await?;
    tracing::info!(user_id = %user.id, "profile updated");
    Ok(user)
}
