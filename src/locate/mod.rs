// src/locate/mod.rs

//! Resolving an executable name to its on-disk identity.
//!
//! The watcher only ever asks one question: "where does this name resolve to
//! right now, and when was that file last modified?". [`BinaryLocator`] is the
//! seam for that question so tests can script the answers
//! ([`mock::ScriptedLocator`]) instead of touching the real filesystem.

use std::ffi::OsStr;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::errors::{Result, WatchrunError};

pub mod mock;

/// Resolved path plus modification time of the watched executable.
///
/// Two identities are equal iff both fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryIdentity {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl BinaryIdentity {
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            modified,
        }
    }

    /// Read the identity of an already-resolved path.
    pub fn of_path(path: &Path) -> Result<Self> {
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|source| WatchrunError::Lookup {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(path, modified))
    }
}

/// Abstract executable lookup.
pub trait BinaryLocator: Send + Sync + Debug {
    /// Resolve `name` the way the OS would when launching it, and stat the
    /// result.
    fn lookup(&self, name: &OsStr) -> Result<BinaryIdentity>;
}

/// Lookup through `PATH` (names containing a separator are taken relative to
/// the working directory) followed by a metadata query.
#[derive(Debug, Clone, Default)]
pub struct OsLocator;

impl BinaryLocator for OsLocator {
    fn lookup(&self, name: &OsStr) -> Result<BinaryIdentity> {
        let path = which::which(name).map_err(|source| WatchrunError::Resolve {
            name: name.to_os_string(),
            source,
        })?;
        BinaryIdentity::of_path(&path)
    }
}
