// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor talks to a [`ProcessBackend`] instead of spawning OS
//! processes itself. Production uses [`OsBackend`]; tests plug in a fake
//! backend whose children exit or die on command, so the restart state
//! machine can be exercised without real processes.

use std::ffi::OsString;
use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;

use crate::errors::Result;

use super::process::OsChild;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What to launch: the executable as given on the command line plus its
/// arguments. Standard I/O is always inherited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl LaunchSpec {
    pub fn new<I, S>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// How a reaped child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// Exit code, `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub success: bool,
}

impl ChildExit {
    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
        }
    }

    pub fn killed() -> Self {
        Self {
            code: None,
            success: false,
        }
    }
}

impl From<ExitStatus> for ChildExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }
}

/// A launched child owned by the supervisor.
pub trait SupervisedChild: Send {
    /// OS process id, if the backend has one and the child is not yet reaped.
    fn id(&self) -> Option<u32>;

    /// Wait for the child to exit and reap it.
    ///
    /// Must be cancel safe: the supervisor drops this future when a change or
    /// shutdown wins the race, then calls it again after killing.
    fn wait(&mut self) -> BoxFuture<'_, Result<ChildExit>>;

    /// Forcefully terminate the child and everything in its process group.
    /// Best effort; errors are reported, never fatal.
    fn terminate_group(&mut self) -> Result<()>;
}

/// Trait abstracting how the supervised executable is launched.
pub trait ProcessBackend: Send + Sync {
    fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn SupervisedChild>>;
}

/// Real backend: spawns OS processes with inherited stdio, each in its own
/// process group where the platform supports it.
#[derive(Debug, Clone, Default)]
pub struct OsBackend;

impl OsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessBackend for OsBackend {
    fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn SupervisedChild>> {
        let child = OsChild::spawn(spec)?;
        Ok(Box::new(child))
    }
}
