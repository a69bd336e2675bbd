use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// When the supervisor launches the binary for the first time.
///
/// - `Immediately`: start right away, then restart on every change (default).
/// - `OnChange`: stay idle until the first change of the binary is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartPolicy {
    Immediately,
    OnChange,
}

impl Default for StartPolicy {
    fn default() -> Self {
        StartPolicy::Immediately
    }
}

impl fmt::Display for StartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartPolicy::Immediately => f.write_str("immediately"),
            StartPolicy::OnChange => f.write_str("on-change"),
        }
    }
}

impl FromStr for StartPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediately" => Ok(StartPolicy::Immediately),
            "on-change" | "on_change" => Ok(StartPolicy::OnChange),
            other => Err(format!(
                "invalid start policy: {other} (expected \"immediately\" or \"on-change\")"
            )),
        }
    }
}
