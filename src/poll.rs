//! Background timeline polling.
//!
//! Runs as a tokio task that periodically asks the [`DataSource`] for items
//! newer than the collection's cursor and feeds them into the
//! [`ItemCollection`].
//!
//! ## For contributors
//!
//! The poller is intentionally simple: fetch, add, sleep, forever.  A failed
//! or hung fetch is logged and retried on the next tick; it never takes the
//! task down and never holds the collection's lock, since the fetch happens
//! before any `add` call.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::collection::ItemCollection;
use crate::source::DataSource;

/// Default delay between polls.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Default upper bound on a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Consecutive failed ticks before the poller logs at error level.
const FAILURE_STREAK_ALERT: u32 = 5;

/// Poll cadence.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Sleep between the end of one tick and the start of the next.
    pub interval: Duration,
    /// A fetch still running after this long is abandoned.
    pub fetch_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The source returned `received` items, `added` of which were new.
    Added { received: usize, added: usize },
    /// The source had nothing newer than the cursor.
    Empty,
    /// The fetch returned an error (already logged).
    Failed(String),
    /// The fetch did not finish within the timeout.
    TimedOut,
}

pub struct Poller<S> {
    source: S,
    collection: Arc<ItemCollection>,
    settings: PollSettings,
}

impl<S: DataSource + 'static> Poller<S> {
    pub fn new(source: S, collection: Arc<ItemCollection>, settings: PollSettings) -> Self {
        Self {
            source,
            collection,
            settings,
        }
    }

    /// Fetch once and add whatever came back.
    pub async fn tick(&self) -> TickOutcome {
        let cursor = self.collection.newest_id();
        let since_id = (!cursor.is_empty()).then_some(cursor.as_str());

        let fetched = tokio::time::timeout(
            self.settings.fetch_timeout,
            self.source.fetch(since_id),
        )
        .await;

        let items = match fetched {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                tracing::warn!(source = self.source.name(), error = %e, "fetch failed, retrying next tick");
                return TickOutcome::Failed(e.to_string());
            }
            Err(_) => {
                tracing::warn!(
                    source = self.source.name(),
                    timeout = ?self.settings.fetch_timeout,
                    "fetch timed out, retrying next tick"
                );
                return TickOutcome::TimedOut;
            }
        };

        if items.is_empty() {
            tracing::debug!(source = self.source.name(), since_id = ?since_id, "nothing new");
            return TickOutcome::Empty;
        }

        let received = items.len();
        let mut added = 0;
        for item in items {
            tracing::trace!(%item, "received");
            if self.collection.add(item) {
                added += 1;
            }
        }

        tracing::info!(
            source = self.source.name(),
            received,
            added,
            retained = self.collection.len(),
            newest_id = %self.collection.newest_id(),
            "poll complete"
        );
        TickOutcome::Added { received, added }
    }

    /// Poll forever.
    pub async fn run(self) {
        let mut failures = 0u32;
        loop {
            match self.tick().await {
                TickOutcome::Failed(_) | TickOutcome::TimedOut => {
                    failures += 1;
                    if failures == FAILURE_STREAK_ALERT {
                        tracing::error!(
                            source = self.source.name(),
                            failures,
                            "source keeps failing; serving a stale window"
                        );
                    }
                }
                TickOutcome::Added { .. } | TickOutcome::Empty => {
                    if failures >= FAILURE_STREAK_ALERT {
                        tracing::info!(source = self.source.name(), failures, "source recovered");
                    }
                    failures = 0;
                }
            }
            tokio::time::sleep(self.settings.interval).await;
        }
    }

    /// Spawn [`run`](Self::run) onto the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
