// src/supervise/backoff.rs

//! Throttling delay applied after the binary exits on its own.
//!
//! The delay starts at [`BackoffConfig::min`], is multiplied after every
//! natural exit that is not followed by a change within the window, and is
//! capped at [`BackoffConfig::max`]. Any observed change resets it.

use std::time::Duration;

/// Backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub min: Duration,
    pub max: Duration,
    pub multiplier: u32,
}

impl Default for BackoffConfig {
    /// `min = 1s`, `max = 10s`, `multiplier = 2`.
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(10),
            multiplier: 2,
        }
    }
}

/// Current throttling delay. Always within `[min, max]`.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current: Duration,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        // Keep the invariant even for configs that skipped validation.
        let config = BackoffConfig {
            max: config.max.max(config.min),
            multiplier: config.multiplier.max(1),
            ..config
        };
        Self {
            config,
            current: config.min,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn reset(&mut self) -> Duration {
        self.current = self.config.min;
        self.current
    }

    /// Multiply the delay, clamped at the maximum. Returns the new value.
    pub fn grow(&mut self) -> Duration {
        self.current = self
            .current
            .checked_mul(self.config.multiplier)
            .map_or(self.config.max, |next| next.min(self.config.max));
        self.current
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
