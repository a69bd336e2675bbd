// src/change/signal.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::trace;

/// The gate every token handed out since the last announcement shares.
#[derive(Debug)]
struct Generation {
    number: u64,
    gate: CancellationToken,
}

impl Generation {
    fn first() -> Self {
        Self {
            number: 0,
            gate: CancellationToken::new(),
        }
    }
}

/// Broadcast "something changed" primitive without payload.
///
/// Any number of observers call [`ChangeSignal::wait`] to obtain a
/// [`ChangeToken`] for the *next* change. [`ChangeSignal::announce`] releases
/// every token of the current generation at once and installs a fresh,
/// untriggered gate for later callers. Both steps happen under one lock, so a
/// token belongs to exactly one generation and fires at most once.
///
/// Cloning is cheap; clones share the same generation state.
#[derive(Debug, Clone)]
pub struct ChangeSignal {
    current: Arc<Mutex<Generation>>,
}

impl Default for ChangeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Generation::first())),
        }
    }

    /// Token representing "the next change from now". Never blocks.
    pub fn wait(&self) -> ChangeToken {
        let current = self.lock();
        ChangeToken {
            generation: current.number,
            gate: current.gate.clone(),
        }
    }

    /// Release every outstanding token of the current generation and start a
    /// new one. Returns the number of the generation that was released.
    ///
    /// Announcements are not queued: with no waiters this only advances the
    /// generation, and tokens obtained afterwards wait for the next call.
    pub fn announce(&self) -> u64 {
        let mut current = self.lock();
        let next = Generation {
            number: current.number + 1,
            gate: CancellationToken::new(),
        };
        let released = std::mem::replace(&mut *current, next);
        released.gate.cancel();
        trace!(generation = released.number, "change announced");
        released.number
    }

    /// Number of the generation new tokens currently join.
    pub fn generation(&self) -> u64 {
        self.lock().number
    }

    // The guarded section never panics, but a poisoned lock must not take the
    // watcher or supervisor down with it.
    fn lock(&self) -> MutexGuard<'_, Generation> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle for one generation of a [`ChangeSignal`].
#[derive(Debug, Clone)]
pub struct ChangeToken {
    generation: u64,
    gate: CancellationToken,
}

impl ChangeToken {
    /// Resolves once the generation this token belongs to is announced.
    /// Returns immediately if that already happened.
    pub async fn changed(&self) {
        self.gate.cancelled().await
    }

    pub fn has_fired(&self) -> bool {
        self.gate.is_cancelled()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
