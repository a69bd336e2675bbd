// src/watch/watcher.rs

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::change::ChangeSignal;
use crate::locate::{BinaryIdentity, BinaryLocator};

/// How often the executable is re-resolved and stat'ed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Result of a single poll, mostly useful for tests and trace logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// First successful lookup when no baseline existed; not a change.
    Baseline,
    /// Same path and modification time as last time.
    Unchanged,
    /// Identity differs; the given generation was announced.
    Changed { generation: u64 },
    /// Lookup failed. Treated as transient, the baseline is kept.
    Unavailable,
}

/// Polls the identity of one executable and announces changes.
///
/// The last observed identity is private to the watcher and only updated from
/// [`BinaryWatcher::poll_once`].
#[derive(Debug)]
pub struct BinaryWatcher {
    name: OsString,
    locator: Arc<dyn BinaryLocator>,
    signal: ChangeSignal,
    interval: Duration,
    last: Option<BinaryIdentity>,
}

impl BinaryWatcher {
    /// Create a watcher, taking a best-effort baseline snapshot right away.
    pub fn new(
        name: impl Into<OsString>,
        locator: Arc<dyn BinaryLocator>,
        signal: ChangeSignal,
    ) -> Self {
        let name = name.into();
        let last = match locator.lookup(&name) {
            Ok(identity) => Some(identity),
            Err(err) => {
                debug!(binary = ?name, error = %err, "no baseline identity at startup");
                None
            }
        };

        Self {
            name,
            locator,
            signal,
            interval: DEFAULT_POLL_INTERVAL,
            last,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn last_identity(&self) -> Option<&BinaryIdentity> {
        self.last.as_ref()
    }

    /// Resolve the executable once and compare against the baseline.
    pub fn poll_once(&mut self) -> PollOutcome {
        let current = match self.locator.lookup(&self.name) {
            Ok(identity) => identity,
            Err(err) => {
                debug!(binary = ?self.name, error = %err, "binary lookup failed; skipping tick");
                return PollOutcome::Unavailable;
            }
        };

        match &self.last {
            None => {
                debug!(path = ?current.path, "baseline identity established");
                self.last = Some(current);
                PollOutcome::Baseline
            }
            Some(last) if *last == current => PollOutcome::Unchanged,
            Some(last) => {
                info!(
                    old_path = ?last.path,
                    new_path = ?current.path,
                    "binary changed"
                );
                self.last = Some(current);
                let generation = self.signal.announce();
                PollOutcome::Changed { generation }
            }
        }
    }

    /// Poll forever at the configured interval.
    pub async fn run(mut self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            binary = ?self.name,
            interval = ?self.interval,
            "binary watcher started"
        );

        loop {
            ticker.tick().await;
            self.poll_once();
        }
    }

    /// Run the poll loop on its own Tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
