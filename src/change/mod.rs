// src/change/mod.rs

//! Change notification between the binary watcher and the supervisor.
//!
//! The watcher is the only producer in the binary, but the primitive is safe
//! for any number of concurrent producers and consumers.

pub mod signal;

pub use signal::{ChangeSignal, ChangeToken};
