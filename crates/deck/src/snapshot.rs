//! Normalized board state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::warn;

use crate::models::DeckCard;

/// Card identifier, stable across polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User assigned to a card.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Assignee {
    /// Nextcloud user ID.
    pub uid: String,
    /// Display name, falling back to the user ID.
    pub display_name: String,
}

/// A single card, normalized from the Deck API representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    pub description: Option<String>,
    pub due: Option<DateTime<Utc>>,
    pub assignees: BTreeSet<Assignee>,
    pub labels: BTreeSet<String>,
    /// Title of the stack the card sits in.
    pub stack: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Card {
    /// Create a bare card with only an ID and title.
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id: CardId(id),
            title: title.into(),
            description: None,
            due: None,
            assignees: BTreeSet::new(),
            labels: BTreeSet::new(),
            stack: None,
            last_modified: None,
        }
    }

    /// Normalize an API card that lives in `stack`.
    #[must_use]
    pub fn from_api(card: DeckCard, stack: &str) -> Self {
        let due = card.duedate.as_deref().and_then(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| {
                    warn!(card_id = card.id, duedate = raw, error = %e, "Invalid due date format");
                })
                .ok()
        });

        let assignees = card
            .assigned_users
            .into_iter()
            .map(|a| Assignee {
                display_name: a
                    .participant
                    .displayname
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| a.participant.uid.clone()),
                uid: a.participant.uid,
            })
            .collect();

        Self {
            id: CardId(card.id),
            title: card.title,
            description: card.description.filter(|d| !d.trim().is_empty()),
            due,
            assignees,
            labels: card.labels.into_iter().map(|l| l.title).collect(),
            stack: Some(stack.to_string()),
            last_modified: card
                .last_modified
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        }
    }

    /// Set of assigned user IDs.
    #[must_use]
    pub fn assignee_ids(&self) -> BTreeSet<&str> {
        self.assignees.iter().map(|a| a.uid.as_str()).collect()
    }
}

/// All live cards on a board at one poll instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub board_id: u64,
    pub title: String,
    pub etag: Option<String>,
    pub cards: BTreeMap<CardId, Card>,
    pub captured_at: DateTime<Utc>,
}

impl BoardSnapshot {
    /// Build a snapshot from a list of cards. Later duplicates win.
    #[must_use]
    pub fn new(board_id: u64, title: impl Into<String>, cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            board_id,
            title: title.into(),
            etag: None,
            cards: cards.into_iter().map(|c| (c.id, c)).collect(),
            captured_at: Utc::now(),
        }
    }

    /// Look up a card by ID.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
