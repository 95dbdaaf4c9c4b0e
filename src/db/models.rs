use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::validation::EMAIL_REGEX;

pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 255;
pub const PASSWORD_HASH_MAX: usize = 255;
pub const FULL_NAME_MAX: usize = 100;

pub const IMAGE_TITLE_MAX: usize = 500;
pub const IMAGE_DESCRIPTION_MAX: usize = 2000;
pub const URL_MAX: usize = 1000;
pub const LICENSE_MAX: usize = 500;

pub const ENTRY_TITLE_MAX: usize = 200;
pub const ENTRY_CONTENT_MAX: usize = 5000;

pub const MODERATION_NOTES_MAX: usize = 1000;
pub const CONTACT_MESSAGE_MAX: usize = 500;

pub const MESSAGE_SUBJECT_MAX: usize = 200;
pub const MESSAGE_CONTENT_MAX: usize = 2000;

pub const ACTION_TYPE_MAX: usize = 100;
pub const TARGET_TYPE_MAX: usize = 100;
pub const LOG_DESCRIPTION_MAX: usize = 1000;

/// Defines a status enum stored as its lowercase wire string.
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(UnknownStatus(other.to_string())),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status value: {0}")]
pub struct UnknownStatus(pub String);

status_enum! {
    /// Review state of a shared entry. Transitions out of `pending` are
    /// decided by whoever moderates; nothing here enforces an order.
    ModerationStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Flagged => "flagged",
    }
}

status_enum! {
    ContactRequestStatus {
        Pending => "pending",
        Approved => "approved",
        Declined => "declined",
    }
}

status_enum! {
    /// `Deleted` is never written by this crate: per-side deletion lives in
    /// the `deleted_by_*` flags on [`Message`].
    MessageStatus {
        Sent => "sent",
        Read => "read",
        Deleted => "deleted",
    }
}

impl Default for ModerationStatus {
    fn default() -> Self {
        ModerationStatus::Pending
    }
}

impl Default for ContactRequestStatus {
    fn default() -> Self {
        ContactRequestStatus::Pending
    }
}

impl Default for MessageStatus {
    fn default() -> Self {
        MessageStatus::Sent
    }
}

// -- Persisted records --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub(crate) const COLUMNS: &'static str =
        "id, username, email, password_hash, full_name, is_active, is_admin, joined_at, last_login";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            full_name: row.get("full_name")?,
            is_active: row.get("is_active")?,
            is_admin: row.get("is_admin")?,
            joined_at: row.get("joined_at")?,
            last_login: row.get("last_login")?,
        })
    }
}

/// Cached Wikipedia picture of the day, one per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikipediaImage {
    pub id: i64,
    pub image_date: NaiveDate,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub source_url: String,
    pub license_info: String,
    pub fetched_at: DateTime<Utc>,
}

impl WikipediaImage {
    pub(crate) const COLUMNS: &'static str = "id, image_date, title, description, image_url, \
         thumbnail_url, source_url, license_info, fetched_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            image_date: row.get("image_date")?,
            title: row.get("title")?,
            description: row.get("description")?,
            image_url: row.get("image_url")?,
            thumbnail_url: row.get("thumbnail_url")?,
            source_url: row.get("source_url")?,
            license_info: row.get("license_info")?,
            fetched_at: row.get("fetched_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    pub user_id: i64,
    pub wikipedia_image_id: i64,
    pub entry_date: NaiveDate,
    pub title: String,
    pub content: String,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub(crate) const COLUMNS: &'static str = "id, user_id, wikipedia_image_id, entry_date, title, \
         content, is_shared, created_at, updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            wikipedia_image_id: row.get("wikipedia_image_id")?,
            entry_date: row.get("entry_date")?,
            title: row.get("title")?,
            content: row.get("content")?,
            is_shared: row.get("is_shared")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedEntry {
    pub id: i64,
    pub journal_entry_id: i64,
    pub moderation_status: ModerationStatus,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderation_notes: Option<String>,
    pub shared_at: DateTime<Utc>,
    pub view_count: i64,
    pub like_count: i64,
}

impl SharedEntry {
    pub(crate) const COLUMNS: &'static str = "id, journal_entry_id, moderation_status, \
         moderated_by, moderated_at, moderation_notes, shared_at, view_count, like_count";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            journal_entry_id: row.get("journal_entry_id")?,
            moderation_status: row.get("moderation_status")?,
            moderated_by: row.get("moderated_by")?,
            moderated_at: row.get("moderated_at")?,
            moderation_notes: row.get("moderation_notes")?,
            shared_at: row.get("shared_at")?,
            view_count: row.get("view_count")?,
            like_count: row.get("like_count")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryLike {
    pub id: i64,
    pub user_id: i64,
    pub shared_entry_id: i64,
    pub liked_at: DateTime<Utc>,
}

impl EntryLike {
    pub(crate) const COLUMNS: &'static str = "id, user_id, shared_entry_id, liked_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            shared_entry_id: row.get("shared_entry_id")?,
            liked_at: row.get("liked_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub id: i64,
    pub requester_id: i64,
    pub requested_id: i64,
    pub shared_entry_id: i64,
    pub status: ContactRequestStatus,
    pub message: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub response_message: Option<String>,
}

impl ContactRequest {
    pub(crate) const COLUMNS: &'static str = "id, requester_id, requested_id, shared_entry_id, \
         status, message, requested_at, responded_at, response_message";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            requester_id: row.get("requester_id")?,
            requested_id: row.get("requested_id")?,
            shared_entry_id: row.get("shared_entry_id")?,
            status: row.get("status")?,
            message: row.get("message")?,
            requested_at: row.get("requested_at")?,
            responded_at: row.get("responded_at")?,
            response_message: row.get("response_message")?,
        })
    }
}

/// In-app message between two users joined by a contact request.
///
/// `status` and the two `deleted_by_*` flags are independent: hiding a
/// message from one side never touches `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub contact_request_id: i64,
    pub subject: String,
    pub content: String,
    pub status: MessageStatus,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub deleted_by_sender: bool,
    pub deleted_by_recipient: bool,
}

impl Message {
    pub(crate) const COLUMNS: &'static str = "id, sender_id, recipient_id, contact_request_id, \
         subject, content, status, sent_at, read_at, deleted_by_sender, deleted_by_recipient";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            sender_id: row.get("sender_id")?,
            recipient_id: row.get("recipient_id")?,
            contact_request_id: row.get("contact_request_id")?,
            subject: row.get("subject")?,
            content: row.get("content")?,
            status: row.get("status")?,
            sent_at: row.get("sent_at")?,
            read_at: row.get("read_at")?,
            deleted_by_sender: row.get("deleted_by_sender")?,
            deleted_by_recipient: row.get("deleted_by_recipient")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLog {
    pub id: i64,
    pub admin_user_id: i64,
    pub action_type: String,
    pub target_type: String,
    pub target_id: i64,
    pub description: String,
    pub log_metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AdminLog {
    pub(crate) const COLUMNS: &'static str = "id, admin_user_id, action_type, target_type, \
         target_id, description, log_metadata, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let metadata: String = row.get("log_metadata")?;
        let log_metadata = serde_json::from_str(&metadata).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        Ok(Self {
            id: row.get("id")?,
            admin_user_id: row.get("admin_user_id")?,
            action_type: row.get("action_type")?,
            target_type: row.get("target_type")?,
            target_id: row.get("target_id")?,
            description: row.get("description")?,
            log_metadata,
            created_at: row.get("created_at")?,
        })
    }
}

// -- Insert types --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(max = 50))]
    pub username: String,
    #[validate(
        length(max = 255),
        regex(path = "EMAIL_REGEX", code = "email")
    )]
    pub email: String,
    #[validate(length(max = 255))]
    pub password_hash: String,
    #[validate(length(max = 100))]
    pub full_name: String,
    pub is_active: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewWikipediaImage {
    pub image_date: NaiveDate,
    #[validate(length(max = 500))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(length(max = 1000))]
    pub image_url: String,
    #[validate(length(max = 1000))]
    pub thumbnail_url: Option<String>,
    #[validate(length(max = 1000))]
    pub source_url: String,
    #[validate(length(max = 500))]
    pub license_info: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewJournalEntry {
    pub user_id: i64,
    pub wikipedia_image_id: i64,
    pub entry_date: NaiveDate,
    #[validate(length(max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub content: String,
    pub is_shared: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewAdminLog {
    pub admin_user_id: i64,
    #[validate(length(max = 100))]
    pub action_type: String,
    /// e.g. "shared_entry", "user", "message"
    #[validate(length(max = 100))]
    pub target_type: String,
    pub target_id: i64,
    #[validate(length(max = 1000))]
    pub description: String,
    #[serde(default)]
    pub log_metadata: serde_json::Map<String, serde_json::Value>,
}
