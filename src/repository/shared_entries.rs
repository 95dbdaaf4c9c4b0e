use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use validator::Validate;

use crate::db::models::{ModerationStatus, SharedEntry};
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::schemas::ModerationAction;

#[async_trait]
pub trait SharedEntryRepository: Send + Sync {
    /// Publish a journal entry: marks it `is_shared` and creates its
    /// `pending` wrapper together. A second wrapper for the same entry is a
    /// constraint violation.
    async fn share(&self, journal_entry_id: i64) -> AppResult<SharedEntry>;

    async fn get(&self, id: i64) -> AppResult<Option<SharedEntry>>;

    async fn find_by_journal_entry(&self, journal_entry_id: i64)
        -> AppResult<Option<SharedEntry>>;

    /// Oldest first, so a moderation queue reads front to back.
    async fn list_by_status(&self, status: ModerationStatus) -> AppResult<Vec<SharedEntry>>;

    /// Record a moderator's decision. Any status may be written; ordering
    /// of decisions is up to the caller.
    async fn moderate(
        &self,
        id: i64,
        moderator_id: i64,
        action: &ModerationAction,
    ) -> AppResult<SharedEntry>;

    /// Returns the new view count.
    async fn record_view(&self, id: i64) -> AppResult<i64>;
}

pub struct SqliteSharedEntryRepository {
    pool: DbPool,
}

impl SqliteSharedEntryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SharedEntryRepository for SqliteSharedEntryRepository {
    async fn share(&self, journal_entry_id: i64) -> AppResult<SharedEntry> {
        let shared = db::with_transaction(&self.pool, |tx| {
            let marked = tx.execute(
                "UPDATE journal_entries SET is_shared = 1 WHERE id = ?1",
                params![journal_entry_id],
            )?;
            if marked == 0 {
                return Err(AppError::NotFound(format!(
                    "journal entry {}",
                    journal_entry_id
                )));
            }

            let shared = tx.query_row(
                &format!(
                    "INSERT INTO shared_entries (journal_entry_id, moderation_status, shared_at)
                     VALUES (?1, ?2, ?3)
                     RETURNING {}",
                    SharedEntry::COLUMNS
                ),
                params![journal_entry_id, ModerationStatus::Pending, Utc::now()],
                SharedEntry::from_row,
            )?;
            Ok(shared)
        })?;

        tracing::info!(
            "Journal entry {} shared as {}",
            journal_entry_id,
            shared.id
        );
        Ok(shared)
    }

    async fn get(&self, id: i64) -> AppResult<Option<SharedEntry>> {
        let conn = self.pool.get()?;
        let shared = conn
            .query_row(
                &format!(
                    "SELECT {} FROM shared_entries WHERE id = ?1",
                    SharedEntry::COLUMNS
                ),
                params![id],
                SharedEntry::from_row,
            )
            .optional()?;
        Ok(shared)
    }

    async fn find_by_journal_entry(
        &self,
        journal_entry_id: i64,
    ) -> AppResult<Option<SharedEntry>> {
        let conn = self.pool.get()?;
        let shared = conn
            .query_row(
                &format!(
                    "SELECT {} FROM shared_entries WHERE journal_entry_id = ?1",
                    SharedEntry::COLUMNS
                ),
                params![journal_entry_id],
                SharedEntry::from_row,
            )
            .optional()?;
        Ok(shared)
    }

    async fn list_by_status(&self, status: ModerationStatus) -> AppResult<Vec<SharedEntry>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM shared_entries
             WHERE moderation_status = ?1
             ORDER BY shared_at ASC, id ASC",
            SharedEntry::COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![status], SharedEntry::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    async fn moderate(
        &self,
        id: i64,
        moderator_id: i64,
        action: &ModerationAction,
    ) -> AppResult<SharedEntry> {
        action.validate()?;
        let conn = self.pool.get()?;

        let moderated = conn
            .query_row(
                &format!(
                    "UPDATE shared_entries SET
                       moderation_status = ?1,
                       moderation_notes = ?2,
                       moderated_by = ?3,
                       moderated_at = ?4
                     WHERE id = ?5
                     RETURNING {}",
                    SharedEntry::COLUMNS
                ),
                params![action.status, action.notes, moderator_id, Utc::now(), id],
                SharedEntry::from_row,
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("shared entry {}", id)))?;

        tracing::info!(
            "Shared entry {} moderated by {}: {}",
            id,
            moderator_id,
            action.status
        );
        Ok(moderated)
    }

    async fn record_view(&self, id: i64) -> AppResult<i64> {
        let conn = self.pool.get()?;
        let views = conn
            .query_row(
                "UPDATE shared_entries SET view_count = view_count + 1
                 WHERE id = ?1
                 RETURNING view_count",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("shared entry {}", id)))?;
        Ok(views)
    }
}
