//! YouTube Data API v3 `activities.list` client.
//!
//! Only activities of type `upload` carry `contentDetails.upload.videoId`;
//! everything else the endpoint reports (likes, playlist additions, ...) is
//! dropped before it reaches the pipeline.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;

use relay_common::config::{FeedConfig, MAX_PAGE_SIZE};
use relay_common::error::RelayError;
use relay_common::types::UploadEvent;

use crate::{ActivitySource, FeedPage};

/// Projections requested for every activity.
const PARTS: &str = "snippet,contentDetails";

pub struct YouTubeActivities {
    client: Client,
    api_key: String,
    base_url: String,
    max_results: u32,
}

impl YouTubeActivities {
    pub fn new(api_key: String, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_results: MAX_PAGE_SIZE,
        }
    }

    pub fn from_config(api_key: String, config: &FeedConfig) -> Self {
        Self::new(api_key, &config.base_url).with_max_results(config.max_results)
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.clamp(1, MAX_PAGE_SIZE);
        self
    }
}

#[async_trait]
impl ActivitySource for YouTubeActivities {
    async fn fetch_page(
        &self,
        channel_id: &str,
        published_after: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> Result<FeedPage, RelayError> {
        let url = format!("{}/activities", self.base_url);
        let published_after = published_after.to_rfc3339_opts(SecondsFormat::Secs, true);
        let max_results = self.max_results.to_string();

        let mut query: Vec<(&str, &str)> = vec![
            ("part", PARTS),
            ("channelId", channel_id),
            ("maxResults", max_results.as_str()),
            ("publishedAfter", published_after.as_str()),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let resp = self.client.get(&url).query(&query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::Feed(format!(
                "activities.list for channel {} returned {}: {}",
                channel_id, status, body
            )));
        }

        let listing: ActivityListResponse = resp.json().await.map_err(|e| {
            RelayError::Feed(format!(
                "failed to decode activities.list response for channel {}: {}",
                channel_id, e
            ))
        })?;

        Ok(listing.into_page())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityListResponse {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<Activity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Activity {
    snippet: ActivitySnippet,
    #[serde(default)]
    content_details: Option<ActivityContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivitySnippet {
    published_at: DateTime<Utc>,
    channel_id: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    title: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivityContentDetails {
    #[serde(default)]
    upload: Option<UploadDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadDetails {
    video_id: String,
}

impl ActivityListResponse {
    fn into_page(self) -> FeedPage {
        let items = self
            .items
            .into_iter()
            .filter_map(|activity| {
                let video_id = activity
                    .content_details
                    .and_then(|details| details.upload)
                    .map(|upload| upload.video_id)
                    .filter(|id| !id.is_empty());

                match video_id {
                    Some(video_id) => Some(UploadEvent {
                        channel_id: activity.snippet.channel_id,
                        channel_title: activity.snippet.channel_title,
                        video_id,
                        title: activity.snippet.title,
                        published_at: activity.snippet.published_at,
                    }),
                    None => {
                        tracing::debug!(
                            channel_id = %activity.snippet.channel_id,
                            kind = activity.snippet.kind.as_deref().unwrap_or("unknown"),
                            "Ignoring non-upload activity"
                        );
                        None
                    }
                }
            })
            .collect();

        FeedPage {
            items,
            next_page_token: self.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}
