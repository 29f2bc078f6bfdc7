use serde::{Deserialize, Serialize};

use relay_common::config::Profile;
use relay_common::types::video_link;

/// JSON body of a webhook execution: `{username, avatar_url, content}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub username: String,
    pub avatar_url: String,
    pub content: String,
}

impl WebhookMessage {
    /// Announce an upload as the configured profile, linking to the video.
    pub fn for_upload(profile: &Profile, video_id: &str) -> Self {
        Self {
            username: profile.nickname.clone(),
            avatar_url: profile.avatar_url.clone(),
            content: video_link(video_id),
        }
    }
}
