//! Dedup-and-delivery pipeline.
//!
//! One pass over every subscription, in configuration order:
//! 1. Page through the channel's feed from a fixed cutoff
//! 2. Skip uploads the store already knows
//! 3. Record each new upload, then deliver its notification
//!
//! The first error stops the run. A record committed before a failed
//! delivery is kept, so that upload will be skipped by later runs.

use anyhow::Context;
use chrono::{DateTime, Utc};

use relay_common::config::{Profile, Subscription};
use relay_common::types::{RunSummary, UploadEvent};
use relay_feed::{ActivitySource, ChannelPaginator, cutoff};
use relay_notifier::{Notifier, WebhookMessage};

use crate::store::VideoStore;

/// Default reach of the "published after" cutoff.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 3;

/// What happened to a single upload event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Already recorded by an earlier run or page
    Skipped,
    /// Newly recorded under `record_id` and announced
    Delivered { record_id: i64 },
}

/// Drives the feed, the dedup store and the notifier for one run.
pub struct Pipeline<S, D, N> {
    source: S,
    store: D,
    notifier: N,
    profile: Profile,
    subscriptions: Vec<Subscription>,
    lookback_days: u32,
}

impl<S, D, N> Pipeline<S, D, N>
where
    S: ActivitySource,
    D: VideoStore,
    N: Notifier,
{
    pub fn new(
        source: S,
        store: D,
        notifier: N,
        profile: Profile,
        subscriptions: Vec<Subscription>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            profile,
            subscriptions,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Process every subscription once. `run_start` fixes the cutoff for the whole run.
    pub async fn run(&self, run_start: DateTime<Utc>) -> anyhow::Result<RunSummary> {
        let published_after = cutoff(run_start, self.lookback_days);
        let mut summary = RunSummary::default();

        tracing::info!(
            subscriptions = self.subscriptions.len(),
            published_after = %published_after,
            "Starting relay run"
        );

        for subscription in &self.subscriptions {
            if let Err(e) = self
                .process_channel(subscription, published_after, &mut summary)
                .await
            {
                tracing::error!(%summary, "Relay run aborted");
                return Err(e);
            }
            summary.channels += 1;
        }

        tracing::info!(%summary, "Relay run complete");
        Ok(summary)
    }

    async fn process_channel(
        &self,
        subscription: &Subscription,
        published_after: DateTime<Utc>,
        summary: &mut RunSummary,
    ) -> anyhow::Result<()> {
        tracing::info!(
            name = %subscription.name,
            channel_id = %subscription.channel_id,
            "Processing the channel"
        );

        let mut paginator =
            ChannelPaginator::new(&self.source, &subscription.channel_id, published_after)
                .with_context(|| format!("Invalid subscription {}", subscription.name))?;

        while let Some(items) = paginator.next_page().await.with_context(|| {
            format!(
                "Failed to make API call for channel {}",
                subscription.channel_id
            )
        })? {
            for event in &items {
                summary.seen += 1;
                self.process_upload(subscription, event, summary).await?;
            }
        }

        tracing::debug!(
            channel_id = %subscription.channel_id,
            pages = paginator.pages(),
            "Channel feed exhausted"
        );
        Ok(())
    }

    /// Dedup check, then record and notify for a new upload.
    ///
    /// `summary` is updated after each step that completes, so a record
    /// committed ahead of a failed delivery still counts as recorded.
    pub async fn process_upload(
        &self,
        subscription: &Subscription,
        event: &UploadEvent,
        summary: &mut RunSummary,
    ) -> anyhow::Result<ItemOutcome> {
        let seen = self
            .store
            .exists(&event.video_id)
            .await
            .context("Failed to get metadata from database")?;

        if seen {
            tracing::info!(
                video_id = %event.video_id,
                published_at = %event.published_at,
                "Skipping the video"
            );
            summary.skipped += 1;
            return Ok(ItemOutcome::Skipped);
        }

        let record_id = self
            .store
            .record(event)
            .await
            .context("Failed to insert metadata into database")?;
        summary.recorded += 1;

        tracing::info!(
            video_id = %event.video_id,
            published_at = %event.published_at,
            record_id,
            "Inserted the video"
        );

        let message = WebhookMessage::for_upload(&self.profile, &event.video_id);
        let outcome = self
            .notifier
            .deliver(&subscription.webhook_url, &message)
            .await
            .with_context(|| format!("Failed to execute webhook for video {}", event.video_id))?;
        summary.delivered += 1;

        tracing::info!(
            video_id = %event.video_id,
            status = outcome.status,
            attempts = outcome.attempts,
            "Notification delivered"
        );

        Ok(ItemOutcome::Delivered { record_id })
    }
}
