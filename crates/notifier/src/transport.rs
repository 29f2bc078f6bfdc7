use async_trait::async_trait;
use reqwest::Client;

use relay_common::error::RelayError;

use crate::message::WebhookMessage;

/// Header carrying the rate-limit wait, in seconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "X-Ratelimit-Reset-After";

/// Status a webhook returns when the caller is throttled.
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// The parts of a webhook response the notifier acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    /// Raw `X-Ratelimit-Reset-After` value, when present and readable
    pub reset_after: Option<String>,
}

impl WebhookResponse {
    pub fn is_rate_limited(&self) -> bool {
        self.status == STATUS_TOO_MANY_REQUESTS
    }
}

/// Sends one webhook request.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post(&self, url: &str, message: &WebhookMessage) -> Result<WebhookResponse, RelayError>;
}

/// `reqwest`-backed transport. No client-side timeout is applied.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn post(&self, url: &str, message: &WebhookMessage) -> Result<WebhookResponse, RelayError> {
        let resp = self.client.post(url).json(message).send().await?;

        let reset_after = resp
            .headers()
            .get(RATE_LIMIT_RESET_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(WebhookResponse {
            status: resp.status().as_u16(),
            reset_after,
        })
    }
}
