use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};
use validator::Validate;

use crate::db::models::{NewWikipediaImage, WikipediaImage};
use crate::db::DbPool;
use crate::error::AppResult;

#[async_trait]
pub trait WikipediaImageRepository: Send + Sync {
    /// Store the picture for a date. A second picture for the same date is a
    /// constraint violation.
    async fn insert(&self, image: NewWikipediaImage) -> AppResult<WikipediaImage>;

    async fn get(&self, id: i64) -> AppResult<Option<WikipediaImage>>;

    async fn find_by_date(&self, date: NaiveDate) -> AppResult<Option<WikipediaImage>>;

    /// Inclusive on both ends, oldest first.
    async fn list_between(&self, from: NaiveDate, to: NaiveDate)
        -> AppResult<Vec<WikipediaImage>>;
}

pub struct SqliteWikipediaImageRepository {
    pool: DbPool,
}

impl SqliteWikipediaImageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WikipediaImageRepository for SqliteWikipediaImageRepository {
    async fn insert(&self, image: NewWikipediaImage) -> AppResult<WikipediaImage> {
        image.validate()?;
        let conn = self.pool.get()?;

        let stored = conn.query_row(
            &format!(
                "INSERT INTO wikipedia_images
                   (image_date, title, description, image_url, thumbnail_url, source_url, license_info, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 RETURNING {}",
                WikipediaImage::COLUMNS
            ),
            params![
                image.image_date,
                image.title,
                image.description,
                image.image_url,
                image.thumbnail_url,
                image.source_url,
                image.license_info,
                Utc::now(),
            ],
            WikipediaImage::from_row,
        )?;

        tracing::info!("Stored picture of the day for {}", stored.image_date);
        Ok(stored)
    }

    async fn get(&self, id: i64) -> AppResult<Option<WikipediaImage>> {
        let conn = self.pool.get()?;
        let image = conn
            .query_row(
                &format!(
                    "SELECT {} FROM wikipedia_images WHERE id = ?1",
                    WikipediaImage::COLUMNS
                ),
                params![id],
                WikipediaImage::from_row,
            )
            .optional()?;
        Ok(image)
    }

    async fn find_by_date(&self, date: NaiveDate) -> AppResult<Option<WikipediaImage>> {
        let conn = self.pool.get()?;
        let image = conn
            .query_row(
                &format!(
                    "SELECT {} FROM wikipedia_images WHERE image_date = ?1",
                    WikipediaImage::COLUMNS
                ),
                params![date],
                WikipediaImage::from_row,
            )
            .optional()?;
        tracing::debug!("Picture lookup for {}: hit = {}", date, image.is_some());
        Ok(image)
    }

    async fn list_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<WikipediaImage>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM wikipedia_images
             WHERE image_date BETWEEN ?1 AND ?2
             ORDER BY image_date ASC",
            WikipediaImage::COLUMNS
        ))?;

        let images = stmt
            .query_map(params![from, to], WikipediaImage::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::URL_MAX;
    use crate::error::ErrorKind;
    use crate::repository::test_support::{jan_first, new_image, test_pool};

    #[tokio::test]
    async fn insert_and_find_by_date() {
        let (pool, _tmp) = test_pool();
        let repo = SqliteWikipediaImageRepository::new(pool);

        let stored = repo.insert(new_image(jan_first())).await.unwrap();
        assert_eq!(stored.image_date, jan_first());

        let found = repo.find_by_date(jan_first()).await.unwrap();
        assert_eq!(found, Some(stored.clone()));
        assert_eq!(repo.get(stored.id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn one_image_per_date() {
        let (pool, _tmp) = test_pool();
        let repo = SqliteWikipediaImageRepository::new(pool);

        repo.insert(new_image(jan_first())).await.unwrap();
        let err = repo.insert(new_image(jan_first())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Constraint);
        assert!(err.to_string().contains("wikipedia_images.image_date"));
    }

    #[tokio::test]
    async fn oversized_url_is_validation_error() {
        let (pool, _tmp) = test_pool();
        let repo = SqliteWikipediaImageRepository::new(pool);

        let mut image = new_image(jan_first());
        image.image_url = "u".repeat(URL_MAX + 1);
        let err = repo.insert(image).await.unwrap_err();
        assert_eq!(err.field(), Some("image_url"));
    }

    #[tokio::test]
    async fn list_between_is_inclusive_and_ordered() {
        let (pool, _tmp) = test_pool();
        let repo = SqliteWikipediaImageRepository::new(pool);

        for day in [3, 1, 2, 5] {
            let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
            repo.insert(new_image(date)).await.unwrap();
        }

        let images = repo
            .list_between(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            )
            .await
            .unwrap();
        let days: Vec<String> = images.iter().map(|i| i.image_date.to_string()).collect();
        assert_eq!(days, ["2024-01-01", "2024-01-02", "2024-01-03"]);
    }
}
