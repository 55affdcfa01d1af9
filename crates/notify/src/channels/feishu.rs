//! Feishu custom bot webhook channel.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::card::CardMessage;
use crate::error::ChannelError;
use crate::NotifyChannel;

/// Marker left in the example config's webhook URL.
const PLACEHOLDER_WEBHOOK_ID: &str = "your-webhook-id";

/// Default timeout for a single webhook POST.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reject webhook URLs that are empty or still the example placeholder.
pub fn ensure_configured(webhook_url: &str) -> Result<&str, ChannelError> {
    let url = webhook_url.trim();
    if url.is_empty() || url.contains(PLACEHOLDER_WEBHOOK_ID) {
        return Err(ChannelError::NotConfigured(
            "FEISHU_WEBHOOK_URL".to_string(),
        ));
    }
    Ok(url)
}

/// Feishu webhook notification channel.
pub struct FeishuChannel {
    client: reqwest::Client,
}

impl FeishuChannel {
    /// Create a channel whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NotifyChannel for FeishuChannel {
    fn name(&self) -> &'static str {
        "feishu"
    }

    async fn send(&self, card: &CardMessage, webhook_url: &str) -> Result<(), ChannelError> {
        let url = ensure_configured(webhook_url)?;

        debug!(
            channel = "feishu",
            elements = card.card.elements.len(),
            "Sending notification"
        );

        let response = self.client.post(url).json(card).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(
                channel = "feishu",
                status = %status,
                body = %body,
                "Feishu webhook request failed"
            );
            return Err(ChannelError::Status { status, body });
        }

        // Feishu answers 200 with a non-zero code for bad payloads or signatures
        if let Ok(reply) = serde_json::from_str::<FeishuReply>(&body) {
            if let Some(code) = reply.code.or(reply.status_code).filter(|c| *c != 0) {
                let message = reply.msg.or(reply.status_message).unwrap_or_default();
                warn!(
                    channel = "feishu",
                    code,
                    message = %message,
                    "Feishu rejected the notification"
                );
                return Err(ChannelError::Rejected { code, message });
            }
        }

        debug!(channel = "feishu", status = %status, "Notification sent successfully");
        Ok(())
    }
}

// =============================================================================
// Feishu API types
// =============================================================================

#[derive(Debug, Deserialize)]
struct FeishuReply {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(rename = "StatusCode", default)]
    status_code: Option<i64>,
    #[serde(rename = "StatusMessage", default)]
    status_message: Option<String>,
}
