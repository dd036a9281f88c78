//! Nextcloud Deck REST client.
//!
//! Uses the Deck API v1.0 with HTTP basic auth.
//! API Documentation: <https://deck.readthedocs.io/en/latest/API/>

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::error::DeckError;
use crate::models::{DeckBoard, DeckStack};
use crate::snapshot::{BoardSnapshot, Card, CardId};

/// Path of the Deck REST API below the Nextcloud base URL.
const API_PATH: &str = "/index.php/apps/deck/api/v1.0";

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Read-only Deck API client.
#[derive(Clone)]
pub struct DeckClient {
    /// HTTP client.
    client: Client,
    /// Nextcloud base URL without trailing slash.
    base_url: String,
    /// Nextcloud username.
    username: String,
    /// Password or app token.
    password: String,
}

impl std::fmt::Debug for DeckClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeckClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl DeckClient {
    /// Create a new Deck client.
    ///
    /// # Arguments
    /// * `base_url` - Nextcloud URL, e.g. `https://cloud.example.com`
    /// * `username` - Nextcloud username
    /// * `password` - Password or app token
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DeckError> {
        let mut headers = HeaderMap::new();
        headers.insert("OCS-APIRequest", HeaderValue::from_static("true"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DeckError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        })
    }

    /// Browser link to a card.
    #[must_use]
    pub fn card_url(&self, board_id: u64, card_id: CardId) -> String {
        format!("{}/apps/deck/#/board/{board_id}/card/{card_id}", self.base_url)
    }

    /// Make an authenticated GET request against the Deck API.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DeckError> {
        let url = format!("{}{API_PATH}{path}", self.base_url);
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, path, "Failed to parse Deck response");
                DeckError::Decode(e)
            })
        } else {
            Err(DeckError::from_status(status, text))
        }
    }

    /// Fetch board details.
    ///
    /// # Errors
    /// Returns an error if the request fails or the board does not exist.
    pub async fn get_board(&self, board_id: u64) -> Result<DeckBoard, DeckError> {
        self.get(&format!("/boards/{board_id}")).await
    }

    /// Fetch all stacks of a board, with their cards.
    ///
    /// # Errors
    /// Returns an error if the request fails or the board does not exist.
    pub async fn get_stacks(&self, board_id: u64) -> Result<Vec<DeckStack>, DeckError> {
        self.get(&format!("/boards/{board_id}/stacks")).await
    }

    /// Fetch the full board and flatten all live cards into one snapshot.
    ///
    /// # Errors
    /// Returns [`DeckError::Auth`], [`DeckError::NotFound`] or
    /// [`DeckError::Transient`] depending on what went wrong.
    #[instrument(skip(self))]
    pub async fn fetch_board(&self, board_id: u64) -> Result<BoardSnapshot, DeckError> {
        let board = self.get_board(board_id).await?;
        let mut stacks = self.get_stacks(board_id).await?;
        stacks.sort_by_key(|s| s.order);

        let mut cards = Vec::new();
        for stack in stacks {
            let mut stack_cards = stack.cards;
            stack_cards.sort_by_key(|c| c.order);
            cards.extend(
                stack_cards
                    .into_iter()
                    .filter(|c| !c.archived && c.deleted_at == 0)
                    .map(|c| Card::from_api(c, &stack.title)),
            );
        }

        let mut snapshot = BoardSnapshot::new(board.id, board.title, cards);
        snapshot.etag = board.etag;

        info!(
            board_id,
            board = %snapshot.title,
            cards = snapshot.len(),
            "Fetched board"
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_url_strips_trailing_slash() {
        let client = DeckClient::new(
            "https://cloud.example.com/",
            "u",
            "p",
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
        .unwrap();
        assert_eq!(
            client.card_url(4, CardId(99)),
            "https://cloud.example.com/apps/deck/#/board/4/card/99"
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let client = DeckClient::new("https://c", "u", "hunter2", Duration::from_secs(1)).unwrap();
        assert!(!format!("{client:?}").contains("hunter2"));
    }
}
