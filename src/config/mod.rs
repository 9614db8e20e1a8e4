// src/config/mod.rs

//! Configuration loading and validation for buildwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate durations, tool commands and the release layout (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    AssetsSection, BackendSection, BuildTarget, CommandTemplate, ConfigFile, RawConfigFile,
    ScriptsSection, StylesSection, ToolsSection, WatchSection, WatchTimings,
};
pub use validate::MAX_WATCH_TIMING;
