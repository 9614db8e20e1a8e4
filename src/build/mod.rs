// src/build/mod.rs

//! Frontend and backend build actions.
//!
//! - [`mirror`] plans script compiler invocations from a source tree.
//! - [`actions`] runs one target's rebuild through the toolchain or the
//!   filesystem.
//! - [`pipeline`] sequences the actions into the release build and the
//!   initial watch-mode build.

pub mod actions;
pub mod mirror;
pub mod pipeline;

pub use actions::{copy_assets, RebuildActions};
pub use mirror::{collect_files, plan_script_jobs, ScriptJob};
pub use pipeline::{run_build, run_live_build, Stage};
