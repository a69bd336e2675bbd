// src/config/mod.rs

//! Optional TOML configuration for watchrun.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: duration parsing and backoff sanity checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{BackoffSection, ConfigFile, RawConfigFile, SuperviseSection};
pub use validate::parse_duration;
