//! Webhook delivery with a bounded, linear-backoff retry loop.
//!
//! Delivery is best effort by design: after the attempt budget is spent the
//! caller proceeds to the scheduler redirect anyway. Failures are logged and
//! reported back through [`DeliveryOutcome`] so silently-lost leads stay
//! observable, but they never block the user-visible flow.

use std::time::Duration;

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature when signing is configured.
pub const SIGNATURE_HEADER: &str = "X-SIGN";

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Destination webhook endpoint.
    pub webhook_url: String,
    /// Total attempt budget, including the first attempt.
    pub max_attempts: u32,
    /// Base delay for the linear backoff; the wait after failed attempt `k`
    /// (1-based) is `k * retry_base_delay`.
    pub retry_base_delay: Duration,
    /// Shared secret for the `X-SIGN` header. When absent the payload is
    /// posted unsigned, matching the original deployment.
    pub signing_secret: Option<String>,
}

impl DeliveryConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
            signing_secret: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint returned status {0}")]
    Status(u16),
}

/// Result of a full delivery cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Whether any attempt got a 2xx response.
    pub success: bool,
    /// Number of attempts actually made.
    pub attempts: u32,
}

/// HTTP client for posting finalized funnel payloads.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    config: DeliveryConfig,
}

impl WebhookClient {
    pub fn new(config: DeliveryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Posts `body` until a 2xx response or the attempt budget is spent.
    ///
    /// The signature, when configured, is computed over the exact bytes sent
    /// on the wire; re-serializing on the receiving side would not verify.
    pub async fn deliver(&self, body: &[u8]) -> DeliveryOutcome {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.send_once(body).await {
                Ok(()) => {
                    tracing::debug!(attempt, "webhook delivered");
                    return DeliveryOutcome { success: true, attempts: attempt };
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "webhook delivery attempt failed");
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.retry_base_delay * attempt).await;
                    }
                }
            }
        }

        tracing::warn!(
            url = %self.config.webhook_url,
            attempts = max_attempts,
            "webhook delivery exhausted all attempts; lead proceeds to scheduler"
        );
        DeliveryOutcome { success: false, attempts: max_attempts }
    }

    async fn send_once(&self, body: &[u8]) -> Result<(), DeliveryError> {
        let mut request = self
            .client
            .post(&self.config.webhook_url)
            .header("Content-Type", "application/json")
            .body(body.to_vec());

        if let Some(secret) = &self.config.signing_secret {
            request = request.header(SIGNATURE_HEADER, sign(secret, body));
        }

        let response = request.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status(response.status().as_u16()))
        }
    }
}

/// base64(HMAC-SHA256(secret, body)) — the `X-SIGN` wire format.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}
