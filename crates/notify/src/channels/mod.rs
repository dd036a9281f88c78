//! Notification channel implementations.

pub mod discord;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::events::CardEvent;

/// Trait for notification channels.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Deliver a single card event. One call is one outbound request.
    async fn send(&self, event: &CardEvent) -> Result<(), ChannelError>;
}
