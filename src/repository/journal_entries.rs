use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};
use validator::Validate;

use crate::db::models::{JournalEntry, NewJournalEntry};
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::schemas::JournalEntryUpdate;

#[async_trait]
pub trait JournalEntryRepository: Send + Sync {
    /// Owner and picture must exist; otherwise a constraint violation.
    async fn create(&self, entry: NewJournalEntry) -> AppResult<JournalEntry>;

    async fn get(&self, id: i64) -> AppResult<Option<JournalEntry>>;

    /// Apply the fields present in `update` and bump `updated_at`. An entry
    /// that already has a shared wrapper cannot be made private again.
    async fn update(&self, id: i64, update: &JournalEntryUpdate) -> AppResult<JournalEntry>;

    /// Newest entry date first.
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<JournalEntry>>;

    async fn list_for_image(&self, wikipedia_image_id: i64) -> AppResult<Vec<JournalEntry>>;

    async fn find_for_user_on_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> AppResult<Vec<JournalEntry>>;
}

pub struct SqliteJournalEntryRepository {
    pool: DbPool,
}

impl SqliteJournalEntryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn list_where(&self, clause: &str, params: impl rusqlite::Params) -> AppResult<Vec<JournalEntry>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM journal_entries WHERE {} ORDER BY entry_date DESC, id DESC",
            JournalEntry::COLUMNS,
            clause
        ))?;
        let entries = stmt
            .query_map(params, JournalEntry::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

#[async_trait]
impl JournalEntryRepository for SqliteJournalEntryRepository {
    async fn create(&self, entry: NewJournalEntry) -> AppResult<JournalEntry> {
        entry.validate()?;
        let conn = self.pool.get()?;
        let now = Utc::now();

        let created = conn.query_row(
            &format!(
                "INSERT INTO journal_entries
                   (user_id, wikipedia_image_id, entry_date, title, content, is_shared, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 RETURNING {}",
                JournalEntry::COLUMNS
            ),
            params![
                entry.user_id,
                entry.wikipedia_image_id,
                entry.entry_date,
                entry.title,
                entry.content,
                entry.is_shared,
                now,
            ],
            JournalEntry::from_row,
        )?;

        tracing::info!(
            "User {} wrote journal entry {} for {}",
            created.user_id,
            created.id,
            created.entry_date
        );
        Ok(created)
    }

    async fn get(&self, id: i64) -> AppResult<Option<JournalEntry>> {
        let conn = self.pool.get()?;
        let entry = conn
            .query_row(
                &format!(
                    "SELECT {} FROM journal_entries WHERE id = ?1",
                    JournalEntry::COLUMNS
                ),
                params![id],
                JournalEntry::from_row,
            )
            .optional()?;
        Ok(entry)
    }

    async fn update(&self, id: i64, update: &JournalEntryUpdate) -> AppResult<JournalEntry> {
        update.validate()?;

        let updated = db::with_transaction(&self.pool, |tx| {
            if update.is_shared == Some(false) {
                let shared_id: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM shared_entries WHERE journal_entry_id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(shared_id) = shared_id {
                    return Err(AppError::ConstraintViolation(format!(
                        "journal entry {} is published as shared entry {}",
                        id, shared_id
                    )));
                }
            }

            let entry = tx
                .query_row(
                    &format!(
                        "UPDATE journal_entries SET
                           title = COALESCE(?1, title),
                           content = COALESCE(?2, content),
                           is_shared = COALESCE(?3, is_shared),
                           updated_at = ?4
                         WHERE id = ?5
                         RETURNING {}",
                        JournalEntry::COLUMNS
                    ),
                    params![
                        update.title,
                        update.content,
                        update.is_shared,
                        Utc::now(),
                        id
                    ],
                    JournalEntry::from_row,
                )
                .optional()?
                .ok_or_else(|| AppError::NotFound(format!("journal entry {}", id)))?;
            Ok(entry)
        })?;

        tracing::debug!("Updated journal entry {}", id);
        Ok(updated)
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<JournalEntry>> {
        self.list_where("user_id = ?1", params![user_id])
    }

    async fn list_for_image(&self, wikipedia_image_id: i64) -> AppResult<Vec<JournalEntry>> {
        self.list_where("wikipedia_image_id = ?1", params![wikipedia_image_id])
    }

    async fn find_for_user_on_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> AppResult<Vec<JournalEntry>> {
        self.list_where(
            "user_id = ?1 AND entry_date = ?2",
            params![user_id, date],
        )
    }
}
