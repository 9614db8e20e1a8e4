// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`] supervises the long-running backend: start, graceful stop
//!   with a bounded grace period, forceful kill.
//! - [`signal`] delivers the platform's polite termination request.
//! - [`toolchain`] provides the `Toolchain` trait for the external compilers
//!   and the `RealToolchain` used in production.

pub mod process;
pub mod signal;
pub mod toolchain;

pub use process::{ManagedProcess, ProcessExit, ProcessSpec, ProcessState};
pub use toolchain::{RealToolchain, ToolFuture, ToolStage, Toolchain};
