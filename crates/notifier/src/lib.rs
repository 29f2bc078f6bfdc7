//! Webhook notification delivery.
//!
//! A [`WebhookNotifier`] posts one [`WebhookMessage`] per new upload. A
//! rate-limited response (HTTP 429) is retried exactly once after the wait
//! the server asks for in `X-Ratelimit-Reset-After`; anything else the
//! notifier cannot make sense of is a fatal [`RelayError`].

pub mod message;
pub mod transport;
pub mod webhook;

use std::time::Duration;

use async_trait::async_trait;

use relay_common::error::RelayError;

pub use message::WebhookMessage;
pub use transport::{ReqwestTransport, WebhookResponse, WebhookTransport};
pub use webhook::WebhookNotifier;

/// Result of a delivery the webhook accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Status of the final response
    pub status: u16,
    /// Requests sent (1, or 2 after a rate-limit backoff)
    pub attempts: u8,
    /// Time spent in rate-limit backoff
    pub waited: Duration,
}

/// Delivers a single notification to a webhook target.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(
        &self,
        webhook_url: &str,
        message: &WebhookMessage,
    ) -> Result<DeliveryOutcome, RelayError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for &T {
    async fn deliver(
        &self,
        webhook_url: &str,
        message: &WebhookMessage,
    ) -> Result<DeliveryOutcome, RelayError> {
        (**self).deliver(webhook_url, message).await
    }
}
