//! Read-only client for the Nextcloud Deck REST API.
//!
//! Fetches a board with all of its stacks and flattens the live cards into a
//! [`BoardSnapshot`] keyed by [`CardId`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use deck::DeckClient;
//!
//! let client = DeckClient::new("https://cloud.example.com", "bot", "app-token", Duration::from_secs(10))?;
//! let snapshot = client.fetch_board(42).await?;
//! for card in snapshot.cards.values() {
//!     println!("{} ({:?})", card.title, card.stack);
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod client;
pub mod error;
pub mod models;
pub mod snapshot;

pub use client::{DeckClient, DEFAULT_TIMEOUT_SECS};
pub use error::DeckError;
pub use snapshot::{Assignee, BoardSnapshot, Card, CardId};
