//! Notification channel implementations.

pub mod feishu;

use async_trait::async_trait;

use crate::card::CardMessage;
use crate::error::ChannelError;

/// Trait for notification channels.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Deliver a rendered card to `webhook_url`.
    async fn send(&self, card: &CardMessage, webhook_url: &str) -> Result<(), ChannelError>;
}
