// src/exec/process.rs

//! OS child process with inherited stdio.

use std::ffi::OsString;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::errors::{Result, WatchrunError};

use super::backend::{BoxFuture, ChildExit, LaunchSpec, SupervisedChild};
use super::kill;

/// A running child spawned by [`super::OsBackend`].
///
/// On unix the child leads a fresh process group (`pgid == pid`), so a single
/// group kill also reaches anything it spawned itself.
#[derive(Debug)]
pub struct OsChild {
    child: Child,
    program: OsString,
    pgid: Option<i32>,
}

impl OsChild {
    pub fn spawn(spec: &LaunchSpec) -> Result<Self> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|source| WatchrunError::Launch {
            program: spec.program.clone(),
            source,
        })?;

        let pgid = process_group_of(&child);
        debug!(program = ?spec.program, pid = ?child.id(), ?pgid, "spawned child");

        Ok(Self {
            child,
            program: spec.program.clone(),
            pgid,
        })
    }
}

#[cfg(unix)]
fn process_group_of(child: &Child) -> Option<i32> {
    child.id().and_then(|pid| i32::try_from(pid).ok())
}

#[cfg(not(unix))]
fn process_group_of(_child: &Child) -> Option<i32> {
    None
}

impl SupervisedChild for OsChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<ChildExit>> {
        Box::pin(async move {
            let status = self.child.wait().await?;
            Ok(ChildExit::from(status))
        })
    }

    fn terminate_group(&mut self) -> Result<()> {
        debug!(program = ?self.program, pgid = ?self.pgid, "terminating child");
        kill::terminate_group(&mut self.child, self.pgid)
    }
}
