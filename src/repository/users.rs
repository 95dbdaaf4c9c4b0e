use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use validator::Validate;

use crate::db::models::{NewUser, User};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a validated account. Duplicate username or email is a
    /// constraint violation.
    async fn create(&self, user: NewUser) -> AppResult<User>;

    async fn get(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> AppResult<()>;

    async fn set_active(&self, id: i64, active: bool) -> AppResult<()>;

    /// Fails with a constraint violation while anything still references
    /// the account.
    async fn delete(&self, id: i64) -> AppResult<()>;
}

pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn find_by(&self, column: &str, value: &str) -> AppResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE {} = ?1", User::COLUMNS, column),
                params![value],
                User::from_row,
            )
            .optional()?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        user.validate()?;
        let conn = self.pool.get()?;

        let created = conn.query_row(
            &format!(
                "INSERT INTO users (username, email, password_hash, full_name, is_active, is_admin, joined_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {}",
                User::COLUMNS
            ),
            params![
                user.username,
                user.email,
                user.password_hash,
                user.full_name,
                user.is_active,
                user.is_admin,
                Utc::now(),
            ],
            User::from_row,
        )?;

        tracing::info!("Created user {} ({})", created.username, created.id);
        Ok(created)
    }

    async fn get(&self, id: i64) -> AppResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS),
                params![id],
                User::from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_by("username", username)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_by("email", email)
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![at, id],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn set_active(&self, id: i64, active: bool) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE users SET is_active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        if rows == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        tracing::debug!("User {} active = {}", id, active);
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        tracing::info!("Deleted user {}", id);
        Ok(())
    }
}
