use thiserror::Error;

/// Error taxonomy shared by the feed, store and notifier seams.
///
/// Every variant is fatal to a run; the only recovered condition (a single
/// rate-limited webhook response) never surfaces as an error.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Video {0} is already recorded")]
    DuplicateVideo(String),

    #[error("Rate limit error: {0}")]
    RateLimit(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Map an insert failure, turning a unique-constraint violation into
    /// [`RelayError::DuplicateVideo`].
    pub fn from_insert(err: sqlx::Error, video_id: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RelayError::DuplicateVideo(video_id.to_string())
            }
            _ => RelayError::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_stays_database_variant() {
        let err = RelayError::from_insert(sqlx::Error::RowNotFound, "abc");
        assert!(matches!(err, RelayError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_display_messages() {
        let err = RelayError::DuplicateVideo("dQw4w9WgXcQ".to_string());
        assert_eq!(err.to_string(), "Video dQw4w9WgXcQ is already recorded");

        let err = RelayError::RateLimit("missing header".to_string());
        assert_eq!(err.to_string(), "Rate limit error: missing header");
    }
}
