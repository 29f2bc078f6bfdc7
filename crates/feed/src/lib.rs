//! Upload feed: the activity-listing seam, the YouTube client behind it and
//! the per-channel paginator the pipeline drains.

pub mod paginator;
pub mod youtube;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use relay_common::error::RelayError;
use relay_common::types::UploadEvent;

pub use paginator::ChannelPaginator;
pub use youtube::YouTubeActivities;

/// One page of upload events plus the continuation token, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPage {
    pub items: Vec<UploadEvent>,
    pub next_page_token: Option<String>,
}

/// Paginated listing of a channel's recent activity.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Fetch one page of uploads published after `published_after`.
    ///
    /// Items are returned in the order the upstream source supplies them.
    async fn fetch_page(
        &self,
        channel_id: &str,
        published_after: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> Result<FeedPage, RelayError>;
}

#[async_trait]
impl<T: ActivitySource + ?Sized> ActivitySource for &T {
    async fn fetch_page(
        &self,
        channel_id: &str,
        published_after: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> Result<FeedPage, RelayError> {
        (**self).fetch_page(channel_id, published_after, page_token).await
    }
}

/// Earliest publish time considered by a run started at `run_start`.
pub fn cutoff(run_start: DateTime<Utc>, lookback_days: u32) -> DateTime<Utc> {
    run_start - Duration::days(i64::from(lookback_days))
}
