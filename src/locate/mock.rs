// src/locate/mock.rs

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use super::{BinaryIdentity, BinaryLocator};
use crate::errors::{Result, WatchrunError};

/// In-memory locator whose answers are set by the test.
///
/// Names without an entry fail to resolve, which is how tests simulate a
/// binary that is briefly missing mid-rebuild.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLocator {
    entries: Arc<Mutex<HashMap<OsString, BinaryIdentity>>>,
    lookups: Arc<AtomicUsize>,
}

impl ScriptedLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: impl AsRef<OsStr>, path: impl Into<PathBuf>, modified: SystemTime) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            name.as_ref().to_os_string(),
            BinaryIdentity::new(path, modified),
        );
    }

    pub fn remove(&self, name: impl AsRef<OsStr>) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(name.as_ref());
    }

    /// Number of `lookup` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl BinaryLocator for ScriptedLocator {
    fn lookup(&self, name: &OsStr) -> Result<BinaryIdentity> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let entries = self.entries.lock().unwrap();
        entries
            .get(name)
            .cloned()
            .ok_or_else(|| WatchrunError::Resolve {
                name: name.to_os_string(),
                source: which::Error::CannotFindBinaryPath,
            })
    }
}
