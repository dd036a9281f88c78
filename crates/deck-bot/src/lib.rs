//! Posts Nextcloud Deck card changes to Discord.
//!
//! The bot keeps the last board snapshot in memory, polls the board on a
//! fixed delay, and sends one Discord message per card that was created or
//! whose title, description, due date, assignees or labels changed.
//!
//! # Architecture
//!
//! - [`source::BoardSource`] produces [`deck::BoardSnapshot`]s (the Deck client in production)
//! - [`diff::diff`] compares a snapshot against the [`diff::SeenState`]
//! - [`dispatch::CardNotifier`] delivers each change through a [`notify::NotifyChannel`]
//! - [`poller::Poller`] runs the cycle and owns the seen state
//! - [`retry`] wraps both outbound calls in exponential backoff

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod diff;
pub mod dispatch;
pub mod poller;
pub mod retry;
pub mod source;

pub use config::{Args, ConfigError, LogFormat, Settings};
pub use diff::{diff, ChangeKind, ChangedCard, SeenState, TrackedField};
pub use dispatch::{CardNotifier, NotificationResult};
pub use poller::{CycleOutcome, PollPhase, Poller, PollerConfig};
pub use retry::{with_retry_async, RetryConfig, Retryable};
pub use source::BoardSource;
