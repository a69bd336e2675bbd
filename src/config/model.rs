// src/config/model.rs

use serde::Deserialize;

use crate::supervise::{BackoffConfig, SupervisorOptions};
use crate::types::StartPolicy;

/// Configuration file as read from TOML, before validation.
///
/// ```toml
/// [supervise]
/// start = "on-change"
///
/// [backoff]
/// min = "500ms"
/// max = "30s"
/// multiplier = 3
/// ```
///
/// All sections and keys are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub supervise: SuperviseSection,

    #[serde(default)]
    pub backoff: BackoffSection,
}

/// `[supervise]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuperviseSection {
    /// `"immediately"` (default) or `"on-change"`.
    #[serde(default)]
    pub start: StartPolicy,
}

/// `[backoff]` section. Durations are strings like `"250ms"`, `"1s"`, `"2m"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffSection {
    #[serde(default = "default_backoff_min")]
    pub min: String,

    #[serde(default = "default_backoff_max")]
    pub max: String,

    #[serde(default = "default_backoff_multiplier")]
    pub multiplier: u32,
}

fn default_backoff_min() -> String {
    "1s".to_string()
}

fn default_backoff_max() -> String {
    "10s".to_string()
}

fn default_backoff_multiplier() -> u32 {
    2
}

impl Default for BackoffSection {
    fn default() -> Self {
        Self {
            min: default_backoff_min(),
            max: default_backoff_max(),
            multiplier: default_backoff_multiplier(),
        }
    }
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`)
/// or `Default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub start: StartPolicy,
    pub backoff: BackoffConfig,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(start: StartPolicy, backoff: BackoffConfig) -> Self {
        Self { start, backoff }
    }

    pub fn supervisor_options(&self) -> SupervisorOptions {
        SupervisorOptions {
            start: self.start,
            backoff: self.backoff,
        }
    }
}
