//! Card change events that can be delivered to a channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to a card between two polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardChange {
    /// Card appeared on the board
    Created,
    /// A tracked field of the card changed
    Updated,
    /// Card left the board (archived, deleted or moved away)
    Removed,
}

impl CardChange {
    /// Get the Discord embed color for this change.
    #[must_use]
    pub const fn color(&self) -> u32 {
        match self {
            Self::Created => 0x002e_cc71, // Green
            Self::Updated => 0x0003_b2f8, // Blue
            Self::Removed => 0x0095_a5a6, // Grey
        }
    }

    /// Get display name for this change.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "New card",
            Self::Updated => "Card updated",
            Self::Removed => "Card removed",
        }
    }
}

/// A card change, flattened into display-ready values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardEvent {
    pub change: CardChange,
    /// Title of the board the card belongs to.
    pub board: String,
    pub card_id: u64,
    pub title: String,
    /// Link to the card in the Deck web UI.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    /// Assignee display names.
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Names of the fields that differ from the previous poll.
    #[serde(default)]
    pub changed_fields: Vec<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl CardEvent {
    /// Create an event with only the required fields set.
    #[must_use]
    pub fn new(change: CardChange, board: impl Into<String>, card_id: u64, title: impl Into<String>) -> Self {
        Self {
            change,
            board: board.into(),
            card_id,
            title: title.into(),
            url: None,
            stack: None,
            description: None,
            due: None,
            assignees: vec![],
            labels: vec![],
            changed_fields: vec![],
            timestamp: Utc::now(),
        }
    }

    /// Short one-line summary, used for logging.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}: {} (#{})", self.change.as_str(), self.title, self.card_id)
    }
}
