//! The poll loop: fetch, diff, notify, sleep.

use std::sync::Arc;
use std::time::Duration;

use deck::BoardSnapshot;
use notify::NotifyChannel;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::diff::{diff, ChangeKind, ChangedCard, SeenState};
use crate::dispatch::{card_event, CardNotifier};
use crate::retry::{with_retry_async, RetryConfig};
use crate::source::BoardSource;

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Deck board to watch.
    pub board_id: u64,
    /// Sleep between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Backoff for both the fetch and each notification.
    pub retry: RetryConfig,
    /// Notify every card found by the first successful poll.
    pub notify_on_startup: bool,
    /// Notify cards that left the board.
    pub notify_removed: bool,
}

impl From<&Settings> for PollerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            board_id: settings.board_id,
            interval: settings.check_interval,
            retry: settings.retry.clone(),
            notify_on_startup: settings.notify_on_startup,
            notify_removed: settings.notify_removed_cards,
        }
    }
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Sleeping until the next tick.
    Idle,
    /// Fetch, diff and notify in progress.
    Polling,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// First snapshot recorded without notifying.
    Primed { cards: usize },
    /// Changes detected and dispatched (possibly zero).
    Notified {
        changed: usize,
        delivered: usize,
        failed: usize,
    },
    /// Fetch failed; seen state left untouched.
    Aborted { reason: String },
}

/// Watches one board and reports its card changes.
pub struct Poller {
    source: Arc<dyn BoardSource>,
    notifier: CardNotifier,
    config: PollerConfig,
    seen: SeenState,
    phase: PollPhase,
}

impl Poller {
    #[must_use]
    pub fn new(source: Arc<dyn BoardSource>, channel: Arc<dyn NotifyChannel>, config: PollerConfig) -> Self {
        Self {
            source,
            notifier: CardNotifier::new(channel, config.retry.clone()),
            config,
            seen: SeenState::new(),
            phase: PollPhase::Idle,
        }
    }

    #[must_use]
    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    #[must_use]
    pub fn seen(&self) -> &SeenState {
        &self.seen
    }

    /// Run cycles until `shutdown` is cancelled.
    ///
    /// The first cycle starts immediately. Cancellation stops the loop while
    /// idle and abandons an in-flight cycle; the seen state keeps the last
    /// completed snapshot.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let board_id = self.config.board_id;
        info!(
            board_id,
            interval_secs = self.config.interval.as_secs(),
            "Starting board monitor"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            tokio::select! {
                () = shutdown.cancelled() => {
                    info!(board_id, "Shutdown requested, abandoning poll cycle");
                    break;
                }
                outcome = self.run_cycle() => debug!(?outcome, "Poll cycle finished"),
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!(board_id, "Board monitor stopped");
    }

    /// Run one fetch → diff → notify cycle. Never fails.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.phase = PollPhase::Polling;
        let outcome = match self.fetch().await {
            Ok(snapshot) => self.process(snapshot).await,
            Err(reason) => CycleOutcome::Aborted { reason },
        };
        self.phase = PollPhase::Idle;
        outcome
    }

    async fn fetch(&self) -> Result<BoardSnapshot, String> {
        let board_id = self.config.board_id;
        let source = &self.source;
        let (result, attempts) =
            with_retry_async(&self.config.retry, "fetch_board", || source.fetch_board(board_id)).await;

        result.map_err(|e| {
            error!(board_id, attempts, error = %e, "Failed to fetch board, skipping this cycle");
            e.to_string()
        })
    }

    async fn process(&mut self, snapshot: BoardSnapshot) -> CycleOutcome {
        if !self.seen.is_primed() && !self.config.notify_on_startup {
            let cards = snapshot.len();
            info!(board = %snapshot.title, cards, "Recorded initial board state");
            self.seen.replace(snapshot);
            return CycleOutcome::Primed { cards };
        }

        let changes: Vec<ChangedCard> = diff(&self.seen, &snapshot)
            .into_iter()
            .filter(|c| self.config.notify_removed || c.kind != ChangeKind::Removed)
            .collect();

        if changes.is_empty() {
            debug!(board = %snapshot.title, "No card changes");
        } else {
            info!(board = %snapshot.title, changed = changes.len(), "Board updated");
        }

        let mut delivered = 0;
        let mut failed = 0;
        for change in &changes {
            let url = self.source.card_url(snapshot.board_id, change.card.id);
            let event = card_event(change, &snapshot.title, url);
            if self.notifier.notify(&event).await.is_delivered() {
                delivered += 1;
            } else {
                failed += 1;
            }
        }

        if failed > 0 {
            warn!(delivered, failed, "Some notifications were dropped");
        }

        self.seen.replace(snapshot);

        CycleOutcome::Notified {
            changed: changes.len(),
            delivered,
            failed,
        }
    }
}
