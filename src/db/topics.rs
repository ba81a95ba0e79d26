use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{error::Result, search};

#[derive(Debug, Clone, FromRow)]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
    pub created: DateTime<Utc>,
}

/// Exact, case-sensitive lookup; inserts when absent. The unique index on
/// `name` makes concurrent callers converge on one row, and only the caller
/// whose insert landed sees `true`.
pub async fn get_or_create(conn: &mut SqliteConnection, name: &str) -> Result<(Topic, bool)> {
    let inserted = sqlx::query("INSERT INTO topics (id,name,created) VALUES (?,?,?) ON CONFLICT(name) DO NOTHING")
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?
        .rows_affected()
        == 1;

    let topic: Topic = sqlx::query_as("SELECT id,name,created FROM topics WHERE name=?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    if inserted {
        tracing::debug!(topic_id = %topic.id, name, "topic created");
    }
    Ok((topic, inserted))
}

/// Topics whose name contains `query`, oldest first.
pub async fn list(db_pool: &SqlitePool, query: &str) -> Result<Vec<Topic>> {
    let topics: Vec<Topic> = sqlx::query_as("SELECT id,name,created FROM topics ORDER BY created, rowid")
        .fetch_all(db_pool)
        .await?;

    Ok(topics
        .into_iter()
        .filter(|t| search::matches(query, [Some(t.name.as_str())]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{memory, ScratchDb};

    #[tokio::test]
    async fn get_or_create_reuses_the_row() {
        let db_pool = memory().await;
        let mut conn = db_pool.acquire().await.unwrap();

        let (first, created) = get_or_create(&mut conn, "Math").await.unwrap();
        assert!(created);
        let (second, created) = get_or_create(&mut conn, "Math").await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        drop(conn);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics WHERE name='Math'")
            .fetch_one(&db_pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let db_pool = memory().await;
        let mut conn = db_pool.acquire().await.unwrap();

        let (upper, _) = get_or_create(&mut conn, "Math").await.unwrap();
        let (lower, created) = get_or_create(&mut conn, "math").await.unwrap();
        assert!(created);
        assert_ne!(upper.id, lower.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_requests_share_one_topic() {
        let db = ScratchDb::open(2).await;
        let mut first = db.pool.acquire().await.unwrap();
        let mut second = db.pool.acquire().await.unwrap();

        for n in 0..20 {
            let name = format!("Physics {n}");
            let (a, b) = tokio::join!(get_or_create(&mut first, &name), get_or_create(&mut second, &name));
            let ((a, a_created), (b, b_created)) = (a.unwrap(), b.unwrap());

            assert_eq!(a.id, b.id);
            assert!(a_created ^ b_created, "exactly one caller creates {name}");
        }
        drop((first, second));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 20);
    }

    #[tokio::test]
    async fn list_filters_case_insensitively_in_creation_order() {
        let db_pool = memory().await;
        let mut conn = db_pool.acquire().await.unwrap();
        for name in ["Python", "Biology", "Mathematics", "Django"] {
            get_or_create(&mut conn, name).await.unwrap();
        }
        drop(conn);

        let names = |topics: Vec<Topic>| topics.into_iter().map(|t| t.name).collect::<Vec<_>>();
        assert_eq!(names(list(&db_pool, "").await.unwrap()), ["Python", "Biology", "Mathematics", "Django"]);
        assert_eq!(names(list(&db_pool, "O").await.unwrap()), ["Python", "Biology", "Django"]);
        assert!(list(&db_pool, "chemistry").await.unwrap().is_empty());
    }
}
