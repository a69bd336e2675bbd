// src/errors.rs

//! Crate-wide error type and result alias.

use std::ffi::OsString;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("cannot resolve executable {name:?}: {source}")]
    Resolve {
        name: OsString,
        #[source]
        source: which::Error,
    },

    #[error("cannot read metadata of {path:?}: {source}")]
    Lookup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {program:?}: {source}")]
    Launch {
        program: OsString,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchrunError>;
