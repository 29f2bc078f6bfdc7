use chrono::{DateTime, Utc};

use relay_common::error::RelayError;
use relay_common::types::UploadEvent;

use crate::ActivitySource;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Forward-only traversal of one channel's feed for a single run.
///
/// Every request carries the same `published_after` cutoff. Traversal ends
/// once a page arrives with an empty or absent continuation token; a new run
/// builds a new paginator rather than resuming this one.
pub struct ChannelPaginator<'a, S: ActivitySource + ?Sized> {
    source: &'a S,
    channel_id: &'a str,
    published_after: DateTime<Utc>,
    cursor: Cursor,
    pages: u32,
}

impl<'a, S: ActivitySource + ?Sized> ChannelPaginator<'a, S> {
    pub fn new(
        source: &'a S,
        channel_id: &'a str,
        published_after: DateTime<Utc>,
    ) -> Result<Self, RelayError> {
        if channel_id.trim().is_empty() {
            return Err(RelayError::Config("channel id must not be empty".to_string()));
        }

        Ok(Self {
            source,
            channel_id,
            published_after,
            cursor: Cursor::Start,
            pages: 0,
        })
    }

    /// Fetch the next page, or `None` once the feed is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<UploadEvent>>, RelayError> {
        let token = match &self.cursor {
            Cursor::Done => return Ok(None),
            Cursor::Start => None,
            Cursor::Next(token) => Some(token.as_str()),
        };

        let page = self
            .source
            .fetch_page(self.channel_id, self.published_after, token)
            .await?;
        self.pages += 1;

        self.cursor = match page.next_page_token {
            Some(token) if !token.is_empty() => Cursor::Next(token),
            _ => Cursor::Done,
        };

        tracing::debug!(
            channel_id = %self.channel_id,
            page = self.pages,
            items = page.items.len(),
            more = !self.is_done(),
            "Fetched feed page"
        );

        Ok(Some(page.items))
    }

    pub fn is_done(&self) -> bool {
        self.cursor == Cursor::Done
    }

    /// Number of pages fetched so far.
    pub fn pages(&self) -> u32 {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::FeedPage;

    /// Replays scripted pages and records every request it receives.
    struct ScriptedSource {
        pages: Mutex<VecDeque<Result<FeedPage, RelayError>>>,
        requests: Mutex<Vec<(String, DateTime<Utc>, Option<String>)>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<FeedPage, RelayError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ActivitySource for ScriptedSource {
        async fn fetch_page(
            &self,
            channel_id: &str,
            published_after: DateTime<Utc>,
            page_token: Option<&str>,
        ) -> Result<FeedPage, RelayError> {
            self.requests.lock().unwrap().push((
                channel_id.to_string(),
                published_after,
                page_token.map(str::to_string),
            ));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RelayError::Feed("no more scripted pages".to_string())))
        }
    }

    fn upload(video_id: &str) -> UploadEvent {
        UploadEvent {
            channel_id: "UC1".to_string(),
            channel_title: "Channel".to_string(),
            video_id: video_id.to_string(),
            title: format!("Video {}", video_id),
            published_at: Utc::now(),
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> Result<FeedPage, RelayError> {
        Ok(FeedPage {
            items: ids.iter().map(|id| upload(id)).collect(),
            next_page_token: next.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_follows_tokens_until_absent() {
        let source = ScriptedSource::new(vec![page(&["a", "b"], Some("p2")), page(&["c"], None)]);
        let cutoff = Utc::now();
        let mut paginator = ChannelPaginator::new(&source, "UC1", cutoff).unwrap();

        let first = paginator.next_page().await.unwrap().unwrap();
        assert_eq!(first.len(), 2);
        let second = paginator.next_page().await.unwrap().unwrap();
        assert_eq!(second[0].video_id, "c");
        assert!(paginator.next_page().await.unwrap().is_none());
        assert_eq!(paginator.pages(), 2);

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].2, None);
        assert_eq!(requests[1].2.as_deref(), Some("p2"));
        assert!(requests.iter().all(|(_, after, _)| *after == cutoff));
    }

    #[tokio::test]
    async fn test_empty_token_ends_traversal() {
        let source = ScriptedSource::new(vec![page(&["a"], Some(""))]);
        let mut paginator = ChannelPaginator::new(&source, "UC1", Utc::now()).unwrap();

        assert!(paginator.next_page().await.unwrap().is_some());
        assert!(paginator.is_done());
        assert!(paginator.next_page().await.unwrap().is_none());
        assert_eq!(source.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_with_token_is_requeried() {
        let source = ScriptedSource::new(vec![page(&[], Some("p2")), page(&["z"], None)]);
        let mut paginator = ChannelPaginator::new(&source, "UC1", Utc::now()).unwrap();

        assert!(paginator.next_page().await.unwrap().unwrap().is_empty());
        assert_eq!(paginator.next_page().await.unwrap().unwrap()[0].video_id, "z");
        assert!(paginator.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let source = ScriptedSource::new(vec![Err(RelayError::Feed("quota exceeded".to_string()))]);
        let mut paginator = ChannelPaginator::new(&source, "UC1", Utc::now()).unwrap();

        let err = paginator.next_page().await.unwrap_err();
        assert!(matches!(err, RelayError::Feed(_)));
    }

    #[test]
    fn test_empty_channel_id_rejected() {
        let source = ScriptedSource::new(vec![]);
        assert!(matches!(
            ChannelPaginator::new(&source, "  ", Utc::now()),
            Err(RelayError::Config(_))
        ));
    }
}
