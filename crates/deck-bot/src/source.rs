//! Where board snapshots come from.

use async_trait::async_trait;
use deck::{BoardSnapshot, CardId, DeckClient, DeckError};

/// Trait for anything that can produce a board snapshot.
#[async_trait]
pub trait BoardSource: Send + Sync {
    /// Fetch the current state of a board. One call is one fetch attempt.
    async fn fetch_board(&self, board_id: u64) -> Result<BoardSnapshot, DeckError>;

    /// Browser link to a card, if the source knows how to build one.
    fn card_url(&self, _board_id: u64, _card_id: CardId) -> Option<String> {
        None
    }
}

#[async_trait]
impl BoardSource for DeckClient {
    async fn fetch_board(&self, board_id: u64) -> Result<BoardSnapshot, DeckError> {
        DeckClient::fetch_board(self, board_id).await
    }

    fn card_url(&self, board_id: u64, card_id: CardId) -> Option<String> {
        Some(DeckClient::card_url(self, board_id, card_id))
    }
}
