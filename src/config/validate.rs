// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchrunError};
use crate::supervise::BackoffConfig;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WatchrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let backoff = validate_backoff(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.supervise.start, backoff))
    }
}

fn validate_backoff(cfg: &RawConfigFile) -> Result<BackoffConfig> {
    let min = parse_duration(&cfg.backoff.min)
        .map_err(|e| WatchrunError::ConfigError(format!("[backoff].min: {e}")))?;
    let max = parse_duration(&cfg.backoff.max)
        .map_err(|e| WatchrunError::ConfigError(format!("[backoff].max: {e}")))?;

    if min.is_zero() {
        return Err(WatchrunError::ConfigError(
            "[backoff].min must be greater than zero".to_string(),
        ));
    }

    if min > max {
        return Err(WatchrunError::ConfigError(format!(
            "[backoff].min ({}) must not exceed [backoff].max ({})",
            cfg.backoff.min, cfg.backoff.max
        )));
    }

    if cfg.backoff.multiplier == 0 {
        return Err(WatchrunError::ConfigError(
            "[backoff].multiplier must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(BackoffConfig {
        min,
        max,
        multiplier: cfg.backoff.multiplier,
    })
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

    let unit = unit_part.trim().to_lowercase();
    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{unit}'; expected ms, s, m, or h"
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
