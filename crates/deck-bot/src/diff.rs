//! Change detection between two board snapshots.
//!
//! Everything in this module is pure: no I/O, no clocks.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use deck::{BoardSnapshot, Card};

/// Card fields whose change is worth a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrackedField {
    Title,
    Description,
    DueDate,
    Assignees,
    Labels,
}

impl TrackedField {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::DueDate => "due date",
            Self::Assignees => "assignees",
            Self::Labels => "labels",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tracked fields of a card, borrowed for comparison.
#[derive(Debug, PartialEq, Eq)]
pub struct Fingerprint<'a> {
    title: &'a str,
    description: Option<&'a str>,
    due: Option<DateTime<Utc>>,
    assignees: BTreeSet<&'a str>,
    labels: &'a BTreeSet<String>,
}

impl<'a> Fingerprint<'a> {
    #[must_use]
    pub fn of(card: &'a Card) -> Self {
        Self {
            title: &card.title,
            description: card.description.as_deref(),
            due: card.due,
            assignees: card.assignee_ids(),
            labels: &card.labels,
        }
    }

    /// Fields that differ between `self` and `other`, in declaration order.
    #[must_use]
    pub fn changed_fields(&self, other: &Fingerprint<'_>) -> Vec<TrackedField> {
        let mut fields = vec![];
        if self.title != other.title {
            fields.push(TrackedField::Title);
        }
        if self.description != other.description {
            fields.push(TrackedField::Description);
        }
        if self.due != other.due {
            fields.push(TrackedField::DueDate);
        }
        if self.assignees != other.assignees {
            fields.push(TrackedField::Assignees);
        }
        if self.labels != other.labels {
            fields.push(TrackedField::Labels);
        }
        fields
    }
}

/// Kind of change detected for a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// Identifier not seen before.
    Created,
    /// Known card with at least one tracked field changed.
    Updated(Vec<TrackedField>),
    /// Card was in the previous snapshot but is gone now.
    Removed,
}

/// A card that needs to be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedCard {
    pub kind: ChangeKind,
    /// Current card, or the last known version for removals.
    pub card: Card,
}

/// Last snapshot the poller acted on. Empty until the first successful poll.
#[derive(Debug, Clone, Default)]
pub struct SeenState {
    snapshot: Option<BoardSnapshot>,
}

impl SeenState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a snapshot has been recorded yet.
    #[must_use]
    pub fn is_primed(&self) -> bool {
        self.snapshot.is_some()
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&BoardSnapshot> {
        self.snapshot.as_ref()
    }

    /// Replace the remembered snapshot wholesale.
    pub fn replace(&mut self, snapshot: BoardSnapshot) {
        self.snapshot = Some(snapshot);
    }
}

/// Compute the cards that changed between `previous` and `current`.
///
/// The result is ordered by ascending card ID. Against an empty
/// [`SeenState`] every card is [`ChangeKind::Created`].
#[must_use]
pub fn diff(previous: &SeenState, current: &BoardSnapshot) -> Vec<ChangedCard> {
    let Some(prev) = previous.snapshot() else {
        return current
            .cards
            .values()
            .map(|card| ChangedCard {
                kind: ChangeKind::Created,
                card: card.clone(),
            })
            .collect();
    };

    let mut changes: Vec<ChangedCard> = current
        .cards
        .values()
        .filter_map(|card| match prev.get(card.id) {
            None => Some(ChangedCard {
                kind: ChangeKind::Created,
                card: card.clone(),
            }),
            Some(old) => {
                let fields = Fingerprint::of(old).changed_fields(&Fingerprint::of(card));
                (!fields.is_empty()).then(|| ChangedCard {
                    kind: ChangeKind::Updated(fields),
                    card: card.clone(),
                })
            }
        })
        .collect();

    changes.extend(
        prev.cards
            .values()
            .filter(|old| current.get(old.id).is_none())
            .map(|old| ChangedCard {
                kind: ChangeKind::Removed,
                card: old.clone(),
            }),
    );

    changes.sort_by_key(|c| c.card.id);
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use deck::{Assignee, CardId};

    fn card(id: u64, title: &str) -> Card {
        Card::new(id, title)
    }

    fn primed(cards: Vec<Card>) -> SeenState {
        let mut seen = SeenState::new();
        seen.replace(BoardSnapshot::new(1, "Board", cards));
        seen
    }

    fn ids(changes: &[ChangedCard]) -> Vec<u64> {
        changes.iter().map(|c| c.card.id.0).collect()
    }

    #[test]
    fn test_identical_snapshot_has_no_changes() {
        let mut a = card(1, "A");
        a.labels.insert("bug".to_string());
        let snapshot = BoardSnapshot::new(1, "Board", vec![a, card(2, "B")]);

        let mut seen = SeenState::new();
        seen.replace(snapshot.clone());

        assert!(diff(&seen, &snapshot).is_empty());
    }

    #[test]
    fn test_empty_state_reports_everything_as_created() {
        let current = BoardSnapshot::new(1, "Board", vec![card(2, "B"), card(1, "A")]);
        let changes = diff(&SeenState::new(), &current);

        assert_eq!(ids(&changes), vec![1, 2]);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Created));
    }

    #[test]
    fn test_new_identifier_is_created() {
        let seen = primed(vec![card(1, "A")]);
        let current = BoardSnapshot::new(1, "Board", vec![card(1, "A"), card(9, "New")]);

        let changes = diff(&seen, &current);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].card.id, CardId(9));
        assert_eq!(changes[0].kind, ChangeKind::Created);
    }

    #[test]
    fn test_due_date_added_is_update() {
        let seen = primed(vec![card(1, "A")]);
        let mut due = card(1, "A");
        due.due = Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        let current = BoardSnapshot::new(1, "Board", vec![due]);

        let changes = diff(&seen, &current);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Updated(vec![TrackedField::DueDate]));
    }

    #[test]
    fn test_multiple_fields_reported() {
        let seen = primed(vec![card(1, "A")]);
        let mut changed = card(1, "A2");
        changed.description = Some("details".to_string());
        changed.assignees.insert(Assignee {
            uid: "ann".to_string(),
            display_name: "Ann".to_string(),
        });
        changed.labels.insert("ops".to_string());
        let current = BoardSnapshot::new(1, "Board", vec![changed]);

        let changes = diff(&seen, &current);
        assert_eq!(
            changes[0].kind,
            ChangeKind::Updated(vec![
                TrackedField::Title,
                TrackedField::Description,
                TrackedField::Assignees,
                TrackedField::Labels,
            ])
        );
    }

    #[test]
    fn test_untracked_fields_are_ignored() {
        let mut old = card(1, "A");
        old.stack = Some("Todo".to_string());
        let seen = primed(vec![old]);

        let mut moved = card(1, "A");
        moved.stack = Some("Done".to_string());
        moved.last_modified = Some(Utc::now());
        let current = BoardSnapshot::new(1, "Board", vec![moved]);

        assert!(diff(&seen, &current).is_empty());
    }

    #[test]
    fn test_assignee_display_name_is_not_a_change() {
        let mut old = card(1, "A");
        old.assignees.insert(Assignee {
            uid: "ann".to_string(),
            display_name: "Ann".to_string(),
        });
        let seen = primed(vec![old]);

        let mut renamed = card(1, "A");
        renamed.assignees.insert(Assignee {
            uid: "ann".to_string(),
            display_name: "Ann Smith".to_string(),
        });
        let current = BoardSnapshot::new(1, "Board", vec![renamed]);

        assert!(diff(&seen, &current).is_empty());
    }

    #[test]
    fn test_removed_cards_are_reported_in_order() {
        let seen = primed(vec![card(1, "A"), card(3, "C"), card(5, "E")]);
        let current = BoardSnapshot::new(1, "Board", vec![card(1, "A"), card(4, "D")]);

        let changes = diff(&seen, &current);
        assert_eq!(ids(&changes), vec![3, 4, 5]);
        assert_eq!(changes[0].kind, ChangeKind::Removed);
        assert_eq!(changes[1].kind, ChangeKind::Created);
        assert_eq!(changes[2].kind, ChangeKind::Removed);
        assert_eq!(changes[2].card.title, "E");
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let seen = primed(vec![card(2, "B"), card(7, "G")]);
        let forward = vec![card(1, "A"), card(2, "B!"), card(5, "E"), card(9, "I")];
        let mut backward = forward.clone();
        backward.reverse();

        let a = diff(&seen, &BoardSnapshot::new(1, "Board", forward));
        let b = diff(&seen, &BoardSnapshot::new(1, "Board", backward));

        assert_eq!(a, b);
        assert_eq!(ids(&a), vec![1, 2, 5, 7, 9]);
    }

    #[test]
    fn test_seen_state_lifecycle() {
        let mut seen = SeenState::new();
        assert!(!seen.is_primed());
        seen.replace(BoardSnapshot::new(1, "Board", vec![card(1, "A")]));
        assert!(seen.is_primed());
        assert_eq!(seen.snapshot().unwrap().len(), 1);
    }
}
