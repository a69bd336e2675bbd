// src/logging.rs

//! Diagnostics for `watchrun` itself, via `tracing`.
//!
//! The supervised binary inherits stdin, stdout and stderr unchanged. So
//! that its stdout stays clean for pipes and redirects, watchrun only ever
//! writes to stderr, where its lines interleave with the child's own
//! diagnostics. Keep messages short and on one line.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV: &str = "WATCHRUN_LOG";

/// Install the global subscriber. Call once, before the supervisor starts.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let level = resolve_level(cli_level, env.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(())
}

/// `--log-level` wins, then a recognised `WATCHRUN_LOG` value, then `info`.
/// An unrecognised env value falls back to `info` instead of failing startup.
fn resolve_level(cli_level: Option<LogLevel>, env: Option<&str>) -> Level {
    if let Some(level) = cli_level {
        return match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        };
    }

    env.and_then(|s| s.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_environment() {
        assert_eq!(
            resolve_level(Some(LogLevel::Warn), Some("trace")),
            Level::WARN
        );
    }

    #[test]
    fn environment_is_used_without_flag() {
        assert_eq!(resolve_level(None, Some(" Debug ")), Level::DEBUG);
    }

    #[test]
    fn garbage_or_missing_environment_means_info() {
        assert_eq!(resolve_level(None, Some("loud")), Level::INFO);
        assert_eq!(resolve_level(None, None), Level::INFO);
    }
}
