use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use validator::Validate;

use crate::db::models::{ContactRequest, ContactRequestStatus};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::schemas::{ContactRequestCreate, ContactRequestResponse};

#[async_trait]
pub trait ContactRequestRepository: Send + Sync {
    /// `requester_id` asks to contact the author of a shared entry.
    async fn create(
        &self,
        requester_id: i64,
        request: &ContactRequestCreate,
    ) -> AppResult<ContactRequest>;

    async fn get(&self, id: i64) -> AppResult<Option<ContactRequest>>;

    /// Store the requested user's answer and stamp `responded_at`.
    async fn respond(
        &self,
        id: i64,
        response: &ContactRequestResponse,
    ) -> AppResult<ContactRequest>;

    /// Requests addressed to `requested_id`, newest first, optionally
    /// narrowed to one status.
    async fn list_incoming(
        &self,
        requested_id: i64,
        status: Option<ContactRequestStatus>,
    ) -> AppResult<Vec<ContactRequest>>;

    async fn list_outgoing(&self, requester_id: i64) -> AppResult<Vec<ContactRequest>>;
}

pub struct SqliteContactRequestRepository {
    pool: DbPool,
}

impl SqliteContactRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRequestRepository for SqliteContactRequestRepository {
    async fn create(
        &self,
        requester_id: i64,
        request: &ContactRequestCreate,
    ) -> AppResult<ContactRequest> {
        request.validate()?;
        let conn = self.pool.get()?;

        let created = conn.query_row(
            &format!(
                "INSERT INTO contact_requests
                   (requester_id, requested_id, shared_entry_id, status, message, requested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING {}",
                ContactRequest::COLUMNS
            ),
            params![
                requester_id,
                request.requested_id,
                request.shared_entry_id,
                ContactRequestStatus::Pending,
                request.message,
                Utc::now(),
            ],
            ContactRequest::from_row,
        )?;

        tracing::info!(
            "User {} requested contact with {} (request {})",
            requester_id,
            created.requested_id,
            created.id
        );
        Ok(created)
    }

    async fn get(&self, id: i64) -> AppResult<Option<ContactRequest>> {
        let conn = self.pool.get()?;
        let request = conn
            .query_row(
                &format!(
                    "SELECT {} FROM contact_requests WHERE id = ?1",
                    ContactRequest::COLUMNS
                ),
                params![id],
                ContactRequest::from_row,
            )
            .optional()?;
        Ok(request)
    }

    async fn respond(
        &self,
        id: i64,
        response: &ContactRequestResponse,
    ) -> AppResult<ContactRequest> {
        response.validate()?;
        let conn = self.pool.get()?;

        let updated = conn
            .query_row(
                &format!(
                    "UPDATE contact_requests SET
                       status = ?1,
                       response_message = ?2,
                       responded_at = ?3
                     WHERE id = ?4
                     RETURNING {}",
                    ContactRequest::COLUMNS
                ),
                params![response.status, response.response_message, Utc::now(), id],
                ContactRequest::from_row,
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("contact request {}", id)))?;

        tracing::info!("Contact request {} is now {}", id, updated.status);
        Ok(updated)
    }

    async fn list_incoming(
        &self,
        requested_id: i64,
        status: Option<ContactRequestStatus>,
    ) -> AppResult<Vec<ContactRequest>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM contact_requests
             WHERE requested_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY requested_at DESC, id DESC",
            ContactRequest::COLUMNS
        ))?;
        let requests = stmt
            .query_map(params![requested_id, status], ContactRequest::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(requests)
    }

    async fn list_outgoing(&self, requester_id: i64) -> AppResult<Vec<ContactRequest>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM contact_requests
             WHERE requester_id = ?1
             ORDER BY requested_at DESC, id DESC",
            ContactRequest::COLUMNS
        ))?;
        let requests = stmt
            .query_map(params![requester_id], ContactRequest::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(requests)
    }
}
