//! SQLite persistence for users, topics, rooms and messages.
//!
//! Every mutating function is a single transaction; ownership checks run
//! inside that transaction so a rejected call writes nothing.

pub mod messages;
pub mod rooms;
pub mod topics;
pub mod users;

use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

pub use messages::Message;
pub use rooms::Room;
pub use topics::Topic;
pub use users::User;

pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    tracing::info!(url, "database ready");

    Ok(pool)
}

/// A fresh in-memory database. One connection, since every `:memory:`
/// connection is its own database.
#[cfg(test)]
pub(crate) async fn memory() -> SqlitePool {
    connect("sqlite::memory:", 1).await.unwrap()
}

/// A throwaway database file with `connections` connections, for tests that
/// need writers on separate connections. Removed when dropped.
#[cfg(test)]
pub(crate) struct ScratchDb {
    pub(crate) pool: SqlitePool,
    path: std::path::PathBuf,
}

#[cfg(test)]
impl ScratchDb {
    pub(crate) async fn open(connections: u32) -> ScratchDb {
        let path = std::env::temp_dir().join(format!("studygroup-{}.db", uuid::Uuid::now_v7()));
        let pool = connect(&format!("sqlite:{}", path.display()), connections).await.unwrap();
        ScratchDb { pool, path }
    }
}

#[cfg(test)]
impl Drop for ScratchDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use sqlx::SqlitePool;

    use super::users::{self, NewUser, User};

    pub(crate) async fn user(db_pool: &SqlitePool, username: &str) -> User {
        users::insert(db_pool, NewUser {
            email: format!("{username}@x.com"),
            username: username.to_owned(),
            name: None,
            bio: None,
            password_hash: "not-a-real-hash".to_owned(),
        })
        .await
        .unwrap()
    }
}
