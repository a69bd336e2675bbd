// src/exec/kill.rs

//! Platform-specific "terminate the subtree rooted at this child".

use tokio::process::Child;
#[cfg(unix)]
use tracing::debug;

use crate::errors::Result;

/// SIGKILL the whole process group, falling back to the top-level child when
/// the group is unknown or cannot be signalled.
#[cfg(unix)]
pub fn terminate_group(child: &mut Child, pgid: Option<i32>) -> Result<()> {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Some(pgid) = pgid {
        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            Ok(()) => {
                debug!(pgid, "sent SIGKILL to process group");
                return Ok(());
            }
            Err(errno) => {
                debug!(pgid, error = %errno, "group kill failed; killing top-level process only");
            }
        }
    }

    kill_top_level(child)
}

/// Process groups are unavailable here; only the top-level child is killed.
#[cfg(not(unix))]
pub fn terminate_group(child: &mut Child, _pgid: Option<i32>) -> Result<()> {
    kill_top_level(child)
}

fn kill_top_level(child: &mut Child) -> Result<()> {
    child.start_kill()?;
    Ok(())
}
