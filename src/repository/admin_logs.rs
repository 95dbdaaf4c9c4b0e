use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;
use validator::Validate;

use crate::db::models::{AdminLog, NewAdminLog};
use crate::db::DbPool;
use crate::error::AppResult;

/// Audit trail of admin actions. Append-only: storage rejects updates and
/// deletes on `admin_logs`.
#[async_trait]
pub trait AdminLogRepository: Send + Sync {
    async fn append(&self, log: NewAdminLog) -> AppResult<AdminLog>;

    /// Newest first.
    async fn list_recent(&self, limit: u32) -> AppResult<Vec<AdminLog>>;

    async fn list_for_target(&self, target_type: &str, target_id: i64)
        -> AppResult<Vec<AdminLog>>;

    async fn list_by_admin(&self, admin_user_id: i64) -> AppResult<Vec<AdminLog>>;
}

pub struct SqliteAdminLogRepository {
    pool: DbPool,
}

impl SqliteAdminLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminLogRepository for SqliteAdminLogRepository {
    async fn append(&self, log: NewAdminLog) -> AppResult<AdminLog> {
        log.validate()?;
        let conn = self.pool.get()?;
        let metadata = serde_json::to_string(&log.log_metadata)?;

        let stored = conn.query_row(
            &format!(
                "INSERT INTO admin_logs
                   (admin_user_id, action_type, target_type, target_id, description, log_metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {}",
                AdminLog::COLUMNS
            ),
            params![
                log.admin_user_id,
                log.action_type,
                log.target_type,
                log.target_id,
                log.description,
                metadata,
                Utc::now(),
            ],
            AdminLog::from_row,
        )?;

        tracing::info!(
            "Admin {} {} {} {}",
            stored.admin_user_id,
            stored.action_type,
            stored.target_type,
            stored.target_id
        );
        Ok(stored)
    }

    async fn list_recent(&self, limit: u32) -> AppResult<Vec<AdminLog>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM admin_logs ORDER BY created_at DESC, id DESC LIMIT ?1",
            AdminLog::COLUMNS
        ))?;
        let logs = stmt
            .query_map(params![limit], AdminLog::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    async fn list_for_target(
        &self,
        target_type: &str,
        target_id: i64,
    ) -> AppResult<Vec<AdminLog>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM admin_logs
             WHERE target_type = ?1 AND target_id = ?2
             ORDER BY created_at ASC, id ASC",
            AdminLog::COLUMNS
        ))?;
        let logs = stmt
            .query_map(params![target_type, target_id], AdminLog::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    async fn list_by_admin(&self, admin_user_id: i64) -> AppResult<Vec<AdminLog>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM admin_logs
             WHERE admin_user_id = ?1
             ORDER BY created_at ASC, id ASC",
            AdminLog::COLUMNS
        ))?;
        let logs = stmt
            .query_map(params![admin_user_id], AdminLog::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ErrorKind};
    use crate::repository::test_support::{seed_shared_entry, test_pool};
    use serde_json::json;

    fn moderation_log(admin_user_id: i64, target_id: i64) -> NewAdminLog {
        let mut log_metadata = serde_json::Map::new();
        log_metadata.insert("previous_status".into(), json!("pending"));
        log_metadata.insert("reasons".into(), json!(["spam", "links"]));
        NewAdminLog {
            admin_user_id,
            action_type: "moderate_shared_entry".into(),
            target_type: "shared_entry".into(),
            target_id,
            description: "Rejected for spam".into(),
            log_metadata,
        }
    }

    #[tokio::test]
    async fn append_round_trips_metadata() {
        let (pool, _tmp) = test_pool();
        let (users, shared_id) = seed_shared_entry(&pool, &["admin"]);
        let repo = SqliteAdminLogRepository::new(pool);

        let stored = repo
            .append(moderation_log(users[0], shared_id))
            .await
            .unwrap();
        assert_eq!(stored.log_metadata["previous_status"], json!("pending"));
        assert_eq!(stored.log_metadata["reasons"], json!(["spam", "links"]));

        let for_target = repo
            .list_for_target("shared_entry", shared_id)
            .await
            .unwrap();
        assert_eq!(for_target, vec![stored]);
    }

    #[tokio::test]
    async fn empty_metadata_is_stored_as_object() {
        let (pool, _tmp) = test_pool();
        let (users, _shared_id) = seed_shared_entry(&pool, &["admin"]);
        let repo = SqliteAdminLogRepository::new(pool.clone());

        let mut log = moderation_log(users[0], 1);
        log.log_metadata.clear();
        repo.append(log).await.unwrap();

        let raw: String = pool
            .get()
            .unwrap()
            .query_row("SELECT log_metadata FROM admin_logs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, "{}");
    }

    #[tokio::test]
    async fn rows_cannot_be_changed_or_removed() {
        let (pool, _tmp) = test_pool();
        let (users, shared_id) = seed_shared_entry(&pool, &["admin"]);
        let repo = SqliteAdminLogRepository::new(pool.clone());
        repo.append(moderation_log(users[0], shared_id))
            .await
            .unwrap();

        let conn = pool.get().unwrap();
        let err: AppError = conn
            .execute("UPDATE admin_logs SET description = 'edited'", [])
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Constraint);
        assert!(err.to_string().contains("append-only"));

        let err: AppError = conn
            .execute("DELETE FROM admin_logs", [])
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Constraint);
    }

    #[tokio::test]
    async fn listing_by_admin_and_recency() {
        let (pool, _tmp) = test_pool();
        let (users, shared_id) = seed_shared_entry(&pool, &["admin", "other"]);
        let repo = SqliteAdminLogRepository::new(pool);

        let first = repo
            .append(moderation_log(users[0], shared_id))
            .await
            .unwrap();
        let second = repo
            .append(moderation_log(users[1], shared_id))
            .await
            .unwrap();

        let recent = repo.list_recent(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, second.id);

        let by_admin = repo.list_by_admin(users[0]).await.unwrap();
        assert_eq!(by_admin.len(), 1);
        assert_eq!(by_admin[0].id, first.id);
    }

    #[tokio::test]
    async fn unknown_admin_is_constraint_violation() {
        let (pool, _tmp) = test_pool();
        let repo = SqliteAdminLogRepository::new(pool);
        let err = repo.append(moderation_log(5, 1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Constraint);
    }
}
