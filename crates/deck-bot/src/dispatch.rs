//! Turns detected changes into delivered notifications.

use std::sync::Arc;

use notify::{CardChange, CardEvent, NotifyChannel};
use tracing::{debug, error};

use crate::diff::{ChangeKind, ChangedCard};
use crate::retry::{with_retry_async, RetryConfig};

/// Outcome of delivering one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Delivered after `attempts` tries.
    Delivered { attempts: u32 },
    /// Retry budget exhausted or error not retryable.
    Failed { attempts: u32, error: String },
}

impl NotificationResult {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Build the channel payload for a changed card.
#[must_use]
pub fn card_event(change: &ChangedCard, board_title: &str, url: Option<String>) -> CardEvent {
    let card = &change.card;
    let (kind, changed_fields) = match &change.kind {
        ChangeKind::Created => (CardChange::Created, vec![]),
        ChangeKind::Updated(fields) => (
            CardChange::Updated,
            fields.iter().map(|f| f.as_str().to_string()).collect(),
        ),
        ChangeKind::Removed => (CardChange::Removed, vec![]),
    };

    let mut event = CardEvent::new(kind, board_title, card.id.0, card.title.clone());
    event.url = url;
    event.stack = card.stack.clone();
    event.description = card.description.clone();
    event.due = card.due;
    event.assignees = card.assignees.iter().map(|a| a.display_name.clone()).collect();
    event.labels = card.labels.iter().cloned().collect();
    event.changed_fields = changed_fields;
    if let Some(modified) = card.last_modified {
        event.timestamp = modified;
    }
    event
}

/// Delivers card events through a channel with retry and backoff.
#[derive(Clone)]
pub struct CardNotifier {
    channel: Arc<dyn NotifyChannel>,
    retry: RetryConfig,
}

impl CardNotifier {
    #[must_use]
    pub fn new(channel: Arc<dyn NotifyChannel>, retry: RetryConfig) -> Self {
        Self { channel, retry }
    }

    /// Send one event. Never fails: errors are logged and returned as a value.
    pub async fn notify(&self, event: &CardEvent) -> NotificationResult {
        let channel_name = self.channel.name();
        let (result, attempts) =
            with_retry_async(&self.retry, "notify", || self.channel.send(event)).await;

        match result {
            Ok(()) => {
                debug!(channel = channel_name, card_id = event.card_id, attempts, "Notification sent");
                NotificationResult::Delivered { attempts }
            }
            Err(e) => {
                error!(
                    channel = channel_name,
                    card_id = event.card_id,
                    attempts,
                    error = %e,
                    "Failed to send notification, dropping it"
                );
                NotificationResult::Failed {
                    attempts,
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::TrackedField;
    use chrono::{TimeZone, Utc};
    use deck::{Assignee, Card};

    #[test]
    fn test_card_event_carries_card_details() {
        let mut card = Card::new(5, "Deploy");
        card.stack = Some("Doing".to_string());
        card.description = Some("prod".to_string());
        card.assignees.insert(Assignee {
            uid: "ann".to_string(),
            display_name: "Ann".to_string(),
        });
        card.labels.insert("ops".to_string());
        card.last_modified = Some(Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap());

        let change = ChangedCard {
            kind: ChangeKind::Updated(vec![TrackedField::DueDate, TrackedField::Labels]),
            card,
        };
        let event = card_event(&change, "Release", Some("https://x/card/5".to_string()));

        assert_eq!(event.change, CardChange::Updated);
        assert_eq!(event.board, "Release");
        assert_eq!(event.card_id, 5);
        assert_eq!(event.url.as_deref(), Some("https://x/card/5"));
        assert_eq!(event.stack.as_deref(), Some("Doing"));
        assert_eq!(event.assignees, vec!["Ann"]);
        assert_eq!(event.labels, vec!["ops"]);
        assert_eq!(event.changed_fields, vec!["due date", "labels"]);
        assert_eq!(event.timestamp, Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap());
    }

    #[test]
    fn test_removed_maps_to_removed() {
        let change = ChangedCard {
            kind: ChangeKind::Removed,
            card: Card::new(1, "Old"),
        };
        let event = card_event(&change, "Release", None);
        assert_eq!(event.change, CardChange::Removed);
        assert!(event.changed_fields.is_empty());
    }
}
