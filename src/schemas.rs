// Request schemas - validated before anything is mapped onto a stored record
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use validator::Validate;

use crate::db::models::*;
use crate::validation::EMAIL_REGEX;

pub const PASSWORD_MAX: usize = 100;

/// Registration form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserCreate {
    #[validate(length(max = 50))]
    pub username: String,
    #[validate(
        length(max = 255),
        regex(path = "EMAIL_REGEX", code = "email")
    )]
    pub email: String,
    #[validate(length(max = 100))]
    pub password: String,
    #[validate(length(max = 100))]
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserLogin {
    #[validate(length(max = 50))]
    pub username: String,
    #[validate(length(max = 100))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct JournalEntryCreate {
    #[validate(length(max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub content: String,
    #[serde(default)]
    pub is_shared: bool,
}

/// Partial update; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct JournalEntryUpdate {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub content: Option<String>,
    #[serde(default)]
    pub is_shared: Option<bool>,
}

impl JournalEntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.is_shared.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ContactRequestCreate {
    pub requested_id: i64,
    pub shared_entry_id: i64,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ContactRequestResponse {
    pub status: ContactRequestStatus,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub response_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MessageCreate {
    pub recipient_id: i64,
    pub contact_request_id: i64,
    #[validate(length(max = 200))]
    pub subject: String,
    #[validate(length(max = 2000))]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ModerationAction {
    pub status: ModerationStatus,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Picture of the day as returned by the fetch client. Bounds apply once it
/// becomes a [`NewWikipediaImage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikipediaImageResponse {
    pub image_date: NaiveDate,
    pub title: String,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub source_url: String,
    pub license_info: String,
}

impl From<WikipediaImageResponse> for NewWikipediaImage {
    fn from(r: WikipediaImageResponse) -> Self {
        Self {
            image_date: r.image_date,
            title: r.title,
            description: r.description,
            image_url: r.image_url,
            thumbnail_url: r.thumbnail_url,
            source_url: r.source_url,
            license_info: r.license_info,
        }
    }
}

impl NewUser {
    /// Active, non-admin account for a validated registration.
    pub fn from_create(create: &UserCreate, password_hash: String) -> Self {
        Self {
            username: create.username.clone(),
            email: create.email.clone(),
            password_hash,
            full_name: create.full_name.clone(),
            is_active: true,
            is_admin: false,
        }
    }
}

impl NewJournalEntry {
    pub fn from_create(
        user_id: i64,
        wikipedia_image_id: i64,
        entry_date: NaiveDate,
        create: &JournalEntryCreate,
    ) -> Self {
        Self {
            user_id,
            wikipedia_image_id,
            entry_date,
            title: create.title.clone(),
            content: create.content.clone(),
            is_shared: create.is_shared,
        }
    }
}
