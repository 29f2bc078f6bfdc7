use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base of the canonical short link posted for an upload.
pub const VIDEO_LINK_BASE: &str = "https://youtu.be/";

/// A single upload reported by the feed source for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadEvent {
    pub channel_id: String,
    pub channel_title: String,
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

pub fn video_link(video_id: &str) -> String {
    format!("{}{}", VIDEO_LINK_BASE, video_id)
}

/// Persisted proof that an upload has already been processed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoRecord {
    pub id: i64,
    pub channel_id: String,
    pub channel_title: String,
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

/// Counters for one pass over all subscriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Subscriptions fully processed
    pub channels: u32,
    /// Upload events pulled from the feed
    pub seen: u32,
    /// Events skipped because they were already recorded
    pub skipped: u32,
    /// New records committed to the store
    pub recorded: u32,
    /// Notifications accepted by the webhook
    pub delivered: u32,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} channels, {} seen, {} skipped, {} recorded, {} delivered",
            self.channels, self.seen, self.skipped, self.recorded, self.delivered
        )
    }
}
