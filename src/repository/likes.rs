use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;

use crate::db::models::EntryLike;
use crate::db::{self, DbPool};
use crate::error::AppResult;

#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Store a like and bump the entry's `like_count` atomically.
    ///
    /// Storage does not stop the same user liking an entry twice; callers
    /// that want one like per user check [`LikeRepository::has_liked`].
    async fn like(&self, user_id: i64, shared_entry_id: i64) -> AppResult<EntryLike>;

    async fn list_for_entry(&self, shared_entry_id: i64) -> AppResult<Vec<EntryLike>>;

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<EntryLike>>;

    async fn has_liked(&self, user_id: i64, shared_entry_id: i64) -> AppResult<bool>;
}

pub struct SqliteLikeRepository {
    pool: DbPool,
}

impl SqliteLikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn list_where(&self, column: &str, id: i64) -> AppResult<Vec<EntryLike>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM entry_likes WHERE {} = ?1 ORDER BY liked_at ASC, id ASC",
            EntryLike::COLUMNS,
            column
        ))?;
        let likes = stmt
            .query_map(params![id], EntryLike::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(likes)
    }
}

#[async_trait]
impl LikeRepository for SqliteLikeRepository {
    async fn like(&self, user_id: i64, shared_entry_id: i64) -> AppResult<EntryLike> {
        let like = db::with_transaction(&self.pool, |tx| {
            let like = tx.query_row(
                &format!(
                    "INSERT INTO entry_likes (user_id, shared_entry_id, liked_at)
                     VALUES (?1, ?2, ?3)
                     RETURNING {}",
                    EntryLike::COLUMNS
                ),
                params![user_id, shared_entry_id, Utc::now()],
                EntryLike::from_row,
            )?;

            tx.execute(
                "UPDATE shared_entries SET like_count = like_count + 1 WHERE id = ?1",
                params![shared_entry_id],
            )?;

            Ok(like)
        })?;

        tracing::debug!("User {} liked shared entry {}", user_id, shared_entry_id);
        Ok(like)
    }

    async fn list_for_entry(&self, shared_entry_id: i64) -> AppResult<Vec<EntryLike>> {
        self.list_where("shared_entry_id", shared_entry_id)
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<EntryLike>> {
        self.list_where("user_id", user_id)
    }

    async fn has_liked(&self, user_id: i64, shared_entry_id: i64) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let liked: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM entry_likes WHERE user_id = ?1 AND shared_entry_id = ?2)",
            params![user_id, shared_entry_id],
            |row| row.get(0),
        )?;
        Ok(liked)
    }
}
