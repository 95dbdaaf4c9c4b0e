// Repository pattern - isolates all database side effects.
//
// Each repository owns a pool handle; every operation checks out one
// connection for its own duration and returns it when done. Related rows
// are reached by querying on the foreign key, never by holding references.

pub mod admin_logs;
pub mod contact_requests;
pub mod images;
pub mod journal_entries;
pub mod likes;
pub mod messages;
pub mod shared_entries;
pub mod users;

use std::sync::Arc;

pub use admin_logs::{AdminLogRepository, SqliteAdminLogRepository};
pub use contact_requests::{ContactRequestRepository, SqliteContactRequestRepository};
pub use images::{SqliteWikipediaImageRepository, WikipediaImageRepository};
pub use journal_entries::{JournalEntryRepository, SqliteJournalEntryRepository};
pub use likes::{LikeRepository, SqliteLikeRepository};
pub use messages::{MessageRepository, SqliteMessageRepository};
pub use shared_entries::{SharedEntryRepository, SqliteSharedEntryRepository};
pub use users::{SqliteUserRepository, UserRepository};

use crate::db::DbPool;

/// Every repository behind a trait object, sharing one pool.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub images: Arc<dyn WikipediaImageRepository>,
    pub journal_entries: Arc<dyn JournalEntryRepository>,
    pub shared_entries: Arc<dyn SharedEntryRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub contact_requests: Arc<dyn ContactRequestRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub admin_logs: Arc<dyn AdminLogRepository>,
}

impl Repositories {
    pub fn sqlite(pool: DbPool) -> Self {
        Self {
            users: Arc::new(SqliteUserRepository::new(pool.clone())),
            images: Arc::new(SqliteWikipediaImageRepository::new(pool.clone())),
            journal_entries: Arc::new(SqliteJournalEntryRepository::new(pool.clone())),
            shared_entries: Arc::new(SqliteSharedEntryRepository::new(pool.clone())),
            likes: Arc::new(SqliteLikeRepository::new(pool.clone())),
            contact_requests: Arc::new(SqliteContactRequestRepository::new(pool.clone())),
            messages: Arc::new(SqliteMessageRepository::new(pool.clone())),
            admin_logs: Arc::new(SqliteAdminLogRepository::new(pool)),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, Utc};
    use rusqlite::params;
    use tempfile::TempDir;

    use crate::config::DatabaseConfig;
    use crate::db::{self, DbPool};
    use crate::db::models::{NewJournalEntry, NewUser, NewWikipediaImage};

    pub fn test_pool() -> (DbPool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool =
            db::create_pool(&temp_dir.path().join("test.db"), &DatabaseConfig::default()).unwrap();
        db::run_migrations(&pool).unwrap();
        (pool, temp_dir)
    }

    pub fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "$2b$04$abcdefghijklmnopqrstuu".to_string(),
            full_name: format!("{} Example", username),
            is_active: true,
            is_admin: false,
        }
    }

    pub fn new_image(date: NaiveDate) -> NewWikipediaImage {
        NewWikipediaImage {
            image_date: date,
            title: format!("Picture of the day {}", date),
            description: "A featured picture".to_string(),
            image_url: format!("https://upload.wikimedia.org/{}.jpg", date),
            thumbnail_url: Some(format!("https://upload.wikimedia.org/thumb/{}.jpg", date)),
            source_url: format!("https://commons.wikimedia.org/wiki/{}", date),
            license_info: "CC BY-SA 4.0".to_string(),
        }
    }

    pub fn new_entry(user_id: i64, image_id: i64, date: NaiveDate) -> NewJournalEntry {
        NewJournalEntry {
            user_id,
            wikipedia_image_id: image_id,
            entry_date: date,
            title: "Today".to_string(),
            content: "The light on the water reminded me of home.".to_string(),
            is_shared: true,
        }
    }

    pub fn jan_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// Seed a user per name plus one image, one entry by the first user and
    /// a shared wrapper for it. Returns (user ids, shared entry id).
    pub fn seed_shared_entry(pool: &DbPool, usernames: &[&str]) -> (Vec<i64>, i64) {
        let conn = pool.get().unwrap();
        let now = Utc::now();
        let mut ids = Vec::new();
        for name in usernames {
            conn.execute(
                "INSERT INTO users (username, email, password_hash, full_name, joined_at)
                 VALUES (?1, ?2, 'hash', ?1, ?3)",
                params![name, format!("{}@example.com", name), now],
            )
            .unwrap();
            ids.push(conn.last_insert_rowid());
        }
        conn.execute(
            "INSERT INTO wikipedia_images (image_date, title, description, image_url, source_url, license_info, fetched_at)
             VALUES (?1, 't', 'd', 'u', 's', 'l', ?2)",
            params![jan_first(), now],
        )
        .unwrap();
        let image_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO journal_entries (user_id, wikipedia_image_id, entry_date, title, content, is_shared, created_at, updated_at)
             VALUES (?1, ?2, ?3, 't', 'c', 1, ?4, ?4)",
            params![ids[0], image_id, jan_first(), now],
        )
        .unwrap();
        let entry_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO shared_entries (journal_entry_id, shared_at) VALUES (?1, ?2)",
            params![entry_id, now],
        )
        .unwrap();
        (ids, conn.last_insert_rowid())
    }
}
