//! Feishu notifications for Alertmanager alerts.
//!
//! Alerts received from Alertmanager are rendered into a Feishu interactive
//! card using the card template from the relay settings, then posted to the
//! configured custom bot webhook.
//!
//! # Usage
//!
//! ```no_run
//! # async fn run(settings: relay_config::Settings, alerts: Vec<notify::Alert>) -> Result<(), notify::NotifyError> {
//! use notify::{Notifier, Status};
//!
//! let notifier = Notifier::feishu(notify::channels::feishu::DEFAULT_TIMEOUT)?;
//! notifier.notify(&settings, &alerts, Status::Firing).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`render`] builds a [`CardMessage`] from alerts and the card template
//! - [`NotifyChannel`] defines how a card reaches its destination
//! - [`FeishuChannel`] posts cards to a Feishu webhook
//! - [`Notifier`] ties rendering and delivery together

pub mod alert;
pub mod card;
pub mod channels;
pub mod error;
pub mod placeholder;

pub use alert::{Alert, Status, WebhookPayload};
pub use card::{format_start_time, render, CardMessage};
pub use channels::feishu::FeishuChannel;
pub use channels::NotifyChannel;
pub use error::{ChannelError, NotifyError, RenderError};

use relay_config::Settings;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Renders alert batches and hands them to a channel.
pub struct Notifier {
    channel: Arc<dyn NotifyChannel>,
}

impl Notifier {
    /// Create a notifier delivering through `channel`.
    #[must_use]
    pub fn new(channel: Arc<dyn NotifyChannel>) -> Self {
        Self { channel }
    }

    /// Create a notifier posting to Feishu with the given request timeout.
    pub fn feishu(timeout: Duration) -> Result<Self, ChannelError> {
        Ok(Self::new(Arc::new(FeishuChannel::new(timeout)?)))
    }

    /// Render `alerts` and deliver them as one card.
    ///
    /// Nothing is rendered or sent when the webhook URL is not configured.
    /// There is no retry; failures are logged and returned.
    pub async fn notify(
        &self,
        settings: &Settings,
        alerts: &[Alert],
        status: Status,
    ) -> Result<(), NotifyError> {
        let channel_name = self.channel.name();

        if let Err(e) = channels::feishu::ensure_configured(&settings.webhook_url) {
            error!(channel = channel_name, error = %e, "Webhook URL is not configured");
            return Err(e.into());
        }

        let card = render(alerts, status, settings).inspect_err(|e| {
            error!(channel = channel_name, error = %e, "Failed to render card");
        })?;

        match self.channel.send(&card, &settings.webhook_url).await {
            Ok(()) => {
                info!(
                    channel = channel_name,
                    status = %status,
                    alert_count = alerts.len(),
                    "Notification delivered"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    channel = channel_name,
                    status = %status,
                    error = %e,
                    "Failed to deliver notification"
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    /// Channel that records cards instead of sending them.
    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<(CardMessage, String)>>,
    }

    #[async_trait]
    impl NotifyChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, card: &CardMessage, webhook_url: &str) -> Result<(), ChannelError> {
            self.sent
                .lock()
                .await
                .push((card.clone(), webhook_url.to_string()));
            Ok(())
        }
    }

    fn settings(webhook_url: &str, content: &str) -> Settings {
        serde_json::from_value(json!({
            "FEISHU_WEBHOOK_URL": webhook_url,
            "FEISHU_CARD_TEMPLATE": {
                "card": {"config": {}, "elements": [{"tag": "markdown", "content": content}]}
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_notify_sends_one_card() {
        let channel = Arc::new(RecordingChannel::default());
        let notifier = Notifier::new(channel.clone());
        let settings = settings("https://example.test/hook/abc", "{alertname}");

        notifier
            .notify(
                &settings,
                &[Alert::default(), Alert::default()],
                Status::Firing,
            )
            .await
            .unwrap();

        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.card.elements.len(), 2);
        assert_eq!(sent[0].1, "https://example.test/hook/abc");
    }

    #[tokio::test]
    async fn test_unconfigured_url_skips_render() {
        let channel = Arc::new(RecordingChannel::default());
        let notifier = Notifier::new(channel.clone());
        // Template would fail to render; the URL check comes first
        let settings = settings("", "{unknown}");

        let err = notifier
            .notify(&settings, &[Alert::default()], Status::Firing)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NotifyError::Channel(ChannelError::NotConfigured(_))
        ));
        assert!(channel.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_render_error_sends_nothing() {
        let channel = Arc::new(RecordingChannel::default());
        let notifier = Notifier::new(channel.clone());
        let settings = settings("https://example.test/hook/abc", "{unknown}");

        let err = notifier
            .notify(&settings, &[Alert::default()], Status::Resolved)
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Render(_)));
        assert!(channel.sent.lock().await.is_empty());
    }
}
