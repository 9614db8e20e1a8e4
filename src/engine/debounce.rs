// src/engine/debounce.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::RuntimeEvent;

/// Stand-in deadline for delays too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A scheduled restart that has not fired yet.
///
/// Dropping the value does **not** cancel the timer; call [`cancel`].
///
/// [`cancel`]: PendingRestart::cancel
#[derive(Debug)]
pub struct PendingRestart {
    generation: u64,
    fire_at: Instant,
    handle: JoinHandle<()>,
}

impl PendingRestart {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fire_at(&self) -> Instant {
        self.fire_at
    }

    pub fn cancel(self) {
        self.handle.abort();
    }
}

/// Collapses bursts of backend change notifications into one
/// `RuntimeEvent::RestartDue` per quiet period.
///
/// Every `notify` supersedes the pending timer. The runtime confirms a fired
/// timer with [`take_due`], which rejects generations that were superseded
/// after their event was already queued.
///
/// [`take_due`]: Debouncer::take_due
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    next_generation: u64,
    pending: Option<PendingRestart>,
}

impl Debouncer {
    pub fn new(delay: Duration, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            delay,
            runtime_tx,
            next_generation: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a change: cancel the pending timer (if any) and schedule a new
    /// one `delay` from now. Returns the new timer's generation.
    pub fn notify(&mut self) -> u64 {
        if let Some(previous) = self.pending.take() {
            debug!(generation = previous.generation, "superseding pending restart");
            previous.cancel();
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let now = Instant::now();
        let fire_at = now
            .checked_add(self.delay)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let tx = self.runtime_tx.clone();

        let handle = tokio::spawn(async move {
            sleep_until(fire_at).await;
            if tx.send(RuntimeEvent::RestartDue { generation }).await.is_err() {
                warn!(generation, "runtime gone before restart timer fired");
            }
        });

        debug!(generation, delay = ?self.delay, "restart scheduled");
        self.pending = Some(PendingRestart {
            generation,
            fire_at,
            handle,
        });
        generation
    }

    /// Claim a fired timer. Returns `true` only for the current pending
    /// generation, which is then cleared.
    pub fn take_due(&mut self, generation: u64) -> bool {
        match &self.pending {
            Some(pending) if pending.generation == generation => {
                self.pending = None;
                true
            }
            _ => {
                debug!(generation, "ignoring stale restart timer");
                false
            }
        }
    }

    pub fn pending(&self) -> Option<&PendingRestart> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending timer without firing it.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(generation = pending.generation, "pending restart cancelled");
            pending.cancel();
        }
    }
}
