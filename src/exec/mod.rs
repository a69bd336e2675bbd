// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ProcessBackend` / `SupervisedChild` traits the
//!   supervisor is written against, and the production `OsBackend`.
//! - [`process`] spawns the real child with inherited stdio in its own
//!   process group.
//! - [`kill`] holds the per-platform group termination.

pub mod backend;
pub mod kill;
pub mod process;

pub use backend::{BoxFuture, ChildExit, LaunchSpec, OsBackend, ProcessBackend, SupervisedChild};
pub use process::OsChild;
