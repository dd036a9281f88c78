//! Deck REST API response models.
//!
//! Based on the Nextcloud Deck API v1.0 documentation. Only the fields the
//! notifier reads are modelled; everything else is ignored by serde.

use serde::{Deserialize, Deserializer};

// ============================================================================
// Board types
// ============================================================================

/// Board details from `GET /boards/{id}`.
#[derive(Debug, Deserialize)]
pub struct DeckBoard {
    /// Board ID.
    pub id: u64,
    /// Board title.
    pub title: String,
    /// Entity tag that changes whenever anything on the board changes.
    #[serde(rename = "ETag", default)]
    pub etag: Option<String>,
}

/// Stack (list/column) from `GET /boards/{id}/stacks`.
#[derive(Debug, Deserialize)]
pub struct DeckStack {
    /// Stack ID.
    pub id: u64,
    /// Stack title.
    pub title: String,
    /// Display order on the board.
    #[serde(default)]
    pub order: i64,
    /// Cards in this stack. Absent for empty stacks.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cards: Vec<DeckCard>,
}

// ============================================================================
// Card types
// ============================================================================

/// Card as embedded in a stack.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckCard {
    /// Card ID (unique per Nextcloud instance).
    pub id: u64,
    /// Card title.
    pub title: String,
    /// Markdown description.
    #[serde(default)]
    pub description: Option<String>,
    /// Due date as an RFC 3339 string.
    #[serde(default)]
    pub duedate: Option<String>,
    /// Last modification time (Unix seconds).
    #[serde(default)]
    pub last_modified: Option<i64>,
    /// Display order inside its stack.
    #[serde(default)]
    pub order: i64,
    /// Whether the card is archived.
    #[serde(default)]
    pub archived: bool,
    /// Deletion time (Unix seconds), 0 when not deleted.
    #[serde(default)]
    pub deleted_at: i64,
    /// Attached labels.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Vec<DeckLabel>,
    /// User assignments.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assigned_users: Vec<DeckAssignment>,
}

/// Board label.
#[derive(Debug, Deserialize)]
pub struct DeckLabel {
    /// Label title.
    pub title: String,
    /// Hex color without `#`.
    #[serde(default)]
    pub color: Option<String>,
}

/// Assignment of a participant to a card.
#[derive(Debug, Deserialize)]
pub struct DeckAssignment {
    /// Assigned participant.
    pub participant: DeckParticipant,
}

/// User (or group) participating on a board.
#[derive(Debug, Deserialize)]
pub struct DeckParticipant {
    /// Stable user ID.
    pub uid: String,
    /// Human readable name.
    #[serde(default)]
    pub displayname: Option<String>,
}

/// Deck returns `null` instead of `[]` for some empty collections.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_with_nulls() {
        let card: DeckCard = serde_json::from_str(
            r#"{
                "id": 7,
                "title": "Write docs",
                "description": null,
                "duedate": null,
                "labels": null,
                "assignedUsers": null,
                "archived": false,
                "deletedAt": 0,
                "lastModified": 1700000000
            }"#,
        )
        .unwrap();

        assert_eq!(card.id, 7);
        assert!(card.description.is_none());
        assert!(card.labels.is_empty());
        assert!(card.assigned_users.is_empty());
        assert_eq!(card.last_modified, Some(1_700_000_000));
    }

    #[test]
    fn test_stack_without_cards() {
        let stack: DeckStack = serde_json::from_str(r#"{"id": 3, "title": "Done"}"#).unwrap();
        assert!(stack.cards.is_empty());
    }

    #[test]
    fn test_board_etag() {
        let board: DeckBoard =
            serde_json::from_str(r#"{"id": 1, "title": "Ops", "ETag": "abc"}"#).unwrap();
        assert_eq!(board.etag.as_deref(), Some("abc"));
    }
}
