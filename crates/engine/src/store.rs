//! Dedup store: durable record of every upload the relay has claimed.
//!
//! The `uploaded_videos.video_id` unique constraint is the authority on
//! "seen"; `record` surfaces a violation as [`RelayError::DuplicateVideo`]
//! instead of swallowing it.

use async_trait::async_trait;
use sqlx::PgPool;

use relay_common::error::RelayError;
use relay_common::types::{UploadEvent, VideoRecord};

/// Persistence of upload identifiers.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// True iff a record for `video_id` has been committed.
    async fn exists(&self, video_id: &str) -> Result<bool, RelayError>;

    /// Insert a record for `event` and return its assigned id.
    ///
    /// Callers check [`VideoStore::exists`] first; inserting an already
    /// recorded video fails with [`RelayError::DuplicateVideo`].
    async fn record(&self, event: &UploadEvent) -> Result<i64, RelayError>;
}

#[async_trait]
impl<T: VideoStore + ?Sized> VideoStore for &T {
    async fn exists(&self, video_id: &str) -> Result<bool, RelayError> {
        (**self).exists(video_id).await
    }

    async fn record(&self, event: &UploadEvent) -> Result<i64, RelayError> {
        (**self).record(event).await
    }
}

/// PostgreSQL-backed dedup store over a single shared pool.
#[derive(Clone)]
pub struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Point lookup of the full record for `video_id`.
    pub async fn find(&self, video_id: &str) -> Result<Option<VideoRecord>, RelayError> {
        let record = sqlx::query_as::<_, VideoRecord>(
            r#"
            SELECT id, channel_id, channel_title, video_id, title, published_at, recorded_at
            FROM uploaded_videos
            WHERE video_id = $1
            "#,
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Close the underlying pool, waiting for connections to be released.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Disconnected from PostgreSQL");
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    async fn exists(&self, video_id: &str) -> Result<bool, RelayError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM uploaded_videos WHERE video_id = $1)")
                .bind(video_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn record(&self, event: &UploadEvent) -> Result<i64, RelayError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO uploaded_videos (channel_id, channel_title, video_id, title, published_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&event.channel_id)
        .bind(&event.channel_title)
        .bind(&event.video_id)
        .bind(&event.title)
        .bind(event.published_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RelayError::from_insert(e, &event.video_id))?;

        Ok(id)
    }
}
