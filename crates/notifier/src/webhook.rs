use std::time::Duration;

use async_trait::async_trait;

use relay_common::error::RelayError;

use crate::message::WebhookMessage;
use crate::transport::{RATE_LIMIT_RESET_HEADER, ReqwestTransport, WebhookResponse, WebhookTransport};
use crate::{DeliveryOutcome, Notifier};

/// Webhook notifier with single-retry rate-limit handling.
///
/// Delivery is a fixed sequence:
/// 1. send the message; any non-429 response is final
/// 2. on 429, wait for exactly `X-Ratelimit-Reset-After` seconds
/// 3. send the same message once more; a non-429 response is final,
///    a second 429 is fatal
///
/// The wait is taken from the server as-is and is not capped.
pub struct WebhookNotifier<T: WebhookTransport = ReqwestTransport> {
    transport: T,
}

impl WebhookNotifier<ReqwestTransport> {
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }
}

impl Default for WebhookNotifier<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: WebhookTransport> WebhookNotifier<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    fn accepted(response: &WebhookResponse, attempts: u8, waited: Duration) -> DeliveryOutcome {
        if !(200..300).contains(&response.status) {
            tracing::warn!(
                status = response.status,
                attempts,
                "Webhook answered with a non-success status"
            );
        }

        DeliveryOutcome {
            status: response.status,
            attempts,
            waited,
        }
    }
}

#[async_trait]
impl<T: WebhookTransport> Notifier for WebhookNotifier<T> {
    async fn deliver(
        &self,
        webhook_url: &str,
        message: &WebhookMessage,
    ) -> Result<DeliveryOutcome, RelayError> {
        let first = self.transport.post(webhook_url, message).await?;
        if !first.is_rate_limited() {
            return Ok(Self::accepted(&first, 1, Duration::ZERO));
        }

        let wait = parse_reset_after(first.reset_after.as_deref())?;
        tracing::warn!(
            wait_secs = wait.as_secs_f64(),
            content = %message.content,
            "Reached webhook rate limit, sleeping before retry"
        );
        tokio::time::sleep(wait).await;

        let retry = self.transport.post(webhook_url, message).await?;
        if retry.is_rate_limited() {
            return Err(RelayError::RateLimit(format!(
                "webhook still rate limited after waiting {:.3}s",
                wait.as_secs_f64()
            )));
        }

        Ok(Self::accepted(&retry, 2, wait))
    }
}

/// Interpret a reset-after header value as a number of seconds.
///
/// Integers and fractions ("2", "0.25") are accepted. A missing, negative or
/// non-numeric value is an error.
pub fn parse_reset_after(value: Option<&str>) -> Result<Duration, RelayError> {
    let raw = value.ok_or_else(|| {
        RelayError::RateLimit(format!(
            "429 response without a readable {} header",
            RATE_LIMIT_RESET_HEADER
        ))
    })?;

    let seconds: f64 = raw.trim().parse().map_err(|_| {
        RelayError::RateLimit(format!(
            "cannot parse {} value {:?} as seconds",
            RATE_LIMIT_RESET_HEADER, raw
        ))
    })?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(RelayError::RateLimit(format!(
            "{} value {:?} is not a valid wait",
            RATE_LIMIT_RESET_HEADER, raw
        )));
    }

    Duration::try_from_secs_f64(seconds).map_err(|e| {
        RelayError::RateLimit(format!(
            "{} value {:?} is out of range: {}",
            RATE_LIMIT_RESET_HEADER, raw, e
        ))
    })
}
