// src/watch/mod.rs

//! Polling watcher for the supervised executable.
//!
//! No filesystem event API is involved: the watcher re-resolves the binary on
//! a fixed interval and compares `(path, mtime)` with what it saw last. That
//! keeps it robust against build tools that replace the file by renaming a
//! new one over it, and against the binary briefly disappearing mid-build.

pub mod watcher;

pub use watcher::{BinaryWatcher, PollOutcome, DEFAULT_POLL_INTERVAL};
