// src/supervise/mod.rs

//! Restart state machine for the supervised binary.
//!
//! ```text
//! Idle      --change-->          Starting
//! Starting  --launched-->        Running
//! Starting  --launch failed-->   Idle
//! Running   --exit/change-->     Stopping
//! Running   --shutdown-->        ShutDown
//! Stopping  --change-->          Starting   (superseded, or change within the window)
//! Stopping  --window elapsed-->  Idle       (backoff grows)
//! ```
//!
//! [`Supervisor`] owns the child, the [`Backoff`] and the state; nothing else
//! mutates them.

use std::fmt;
use std::time::Duration;

use crate::exec::ChildExit;
use crate::types::StartPolicy;

pub mod backoff;
pub mod shutdown;
pub mod supervisor;

pub use backoff::{Backoff, BackoffConfig};
pub use shutdown::{spawn_shutdown_listener, ShutdownSignals};
pub use supervisor::Supervisor;

/// Where the supervisor currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No child; waiting for a change.
    Idle,
    Starting,
    Running,
    /// Child reaped; doing post-exit accounting.
    Stopping,
    ShutDown,
}

/// Which event ended a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The child exited by itself.
    NaturalExit(ChildExit),
    /// A newer binary was announced; the child was killed.
    Superseded,
    /// Shutdown was requested; the child was killed.
    ShutdownRequested,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::NaturalExit(_) => f.write_str("natural-exit"),
            RunOutcome::Superseded => f.write_str("superseded"),
            RunOutcome::ShutdownRequested => f.write_str("shutdown"),
        }
    }
}

/// Notifications published to an optional observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    StateChanged(SupervisorState),
    Started { pid: Option<u32> },
    LaunchFailed,
    Stopped { outcome: RunOutcome },
    BackoffChanged { current: Duration },
}

/// Options for the supervisor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorOptions {
    pub start: StartPolicy,
    pub backoff: BackoffConfig,
}
