//! Notification channels for Deck card changes.
//!
//! This crate turns a [`CardEvent`] into a chat message and delivers it.
//! Each [`NotifyChannel::send`] call is exactly one outbound request; retry
//! and backoff are left to the caller.
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use notify::{CardChange, CardEvent, DiscordChannel, NotifyChannel};
//!
//! # async fn run() -> Result<(), notify::ChannelError> {
//! let discord = DiscordChannel::new("https://discord.com/api/webhooks/1/abc", Duration::from_secs(10))?
//!     .with_thread_id(None);
//!
//! let event = CardEvent::new(CardChange::Created, "Release", 42, "Write changelog");
//! discord.send(&event).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`NotifyChannel`] trait defines the interface for notification channels
//! - [`DiscordChannel`] implements Discord webhook notifications

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;

pub use channels::discord::{truncate, DiscordChannel, MAX_DESCRIPTION_CHARS, MAX_RETRY_AFTER_SECS};
pub use channels::NotifyChannel;
pub use error::ChannelError;
pub use events::{CardChange, CardEvent};
