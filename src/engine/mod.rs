// src/engine/mod.rs

//! Watch-mode orchestration engine.
//!
//! This module ties together:
//! - the change debouncer for backend sources
//! - the single event loop that reacts to:
//!   - frontend rebuild requests from the watchers
//!   - backend source changes
//!   - debounce timers firing
//!   - shutdown signals
//!
//! The debouncer lives in [`debounce`]; the async event loop and the backend
//! restart sequence are implemented in [`runtime`].

use std::path::PathBuf;

use crate::config::WatchTimings;
use crate::types::TargetKind;

/// Events flowing into the runtime from watchers, timers and signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A frontend source file changed; rebuild the whole target.
    RebuildRequested { target: TargetKind, path: PathBuf },
    /// A backend source file changed; feeds the debouncer.
    BackendSourceChanged { path: PathBuf },
    /// A debounce timer elapsed.
    RestartDue { generation: u64 },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Timing knobs for the runtime.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    pub timings: WatchTimings,
}

pub mod debounce;
pub mod runtime;

pub use debounce::{Debouncer, PendingRestart};
pub use runtime::{spawn_shutdown_listener, Runtime};
