// src/engine/runtime.rs

use std::fmt;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::build::RebuildActions;
use crate::config::WatchTimings;
use crate::errors::Result;
use crate::exec::{ManagedProcess, ProcessSpec};
use crate::types::{Mode, TargetKind};

use super::debounce::Debouncer;
use super::{RuntimeEvent, RuntimeOptions};

type RestartTask = JoinHandle<Option<ManagedProcess>>;

/// Watch-mode event loop.
///
/// Sole owner of the backend handle and the debounce timer. Frontend
/// rebuilds and the backend restart sequence run in spawned tasks so the
/// loop itself never blocks; the restart task takes the current handle by
/// value and hands the new one back when it completes.
pub struct Runtime {
    event_rx: mpsc::Receiver<RuntimeEvent>,
    debouncer: Debouncer,
    actions: RebuildActions,
    backend: ProcessSpec,
    timings: WatchTimings,
    current: Option<ManagedProcess>,
    in_flight: Option<RestartTask>,
    /// A timer fired while a restart was still running.
    restart_queued: bool,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("backend", &self.backend)
            .field("current", &self.current)
            .field("restart_in_flight", &self.in_flight.is_some())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// `event_tx` must feed `event_rx`; the debouncer uses it to deliver
    /// `RestartDue` events back into the loop.
    pub fn new(
        options: RuntimeOptions,
        backend: ProcessSpec,
        actions: RebuildActions,
        event_tx: mpsc::Sender<RuntimeEvent>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
    ) -> Self {
        Self {
            event_rx,
            debouncer: Debouncer::new(options.timings.debounce, event_tx),
            actions,
            backend,
            timings: options.timings,
            current: None,
            in_flight: None,
            restart_queued: false,
        }
    }

    /// Start the backend, then react to events until shutdown is requested.
    ///
    /// Returns only after the backend has been confirmed stopped.
    pub async fn run(mut self) -> Result<()> {
        info!("buildwatch runtime started");
        self.start_backend();

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    let Some(event) = event else {
                        info!("runtime event channel closed; exiting");
                        break;
                    };
                    debug!(?event, "runtime received event");
                    if !self.handle_event(event) {
                        info!("shutdown requested");
                        break;
                    }
                }
                finished = join_restart(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    self.restart_finished(finished);
                }
            }
        }

        self.shutdown().await;
        info!("runtime exiting");
        Ok(())
    }

    /// Returns `false` when the loop should stop.
    fn handle_event(&mut self, event: RuntimeEvent) -> bool {
        match event {
            RuntimeEvent::RebuildRequested { target, path } => {
                self.spawn_rebuild(target, path);
            }
            RuntimeEvent::BackendSourceChanged { path } => {
                info!(path = ?path, "backend source changed");
                self.debouncer.notify();
            }
            RuntimeEvent::RestartDue { generation } => {
                if self.debouncer.take_due(generation) {
                    if self.in_flight.is_some() {
                        debug!(generation, "restart already running; queueing another");
                        self.restart_queued = true;
                    } else {
                        self.begin_restart();
                    }
                }
            }
            RuntimeEvent::ShutdownRequested => return false,
        }
        true
    }

    fn start_backend(&mut self) {
        match ManagedProcess::start(&self.backend) {
            Ok(process) => self.current = Some(process),
            Err(err) => {
                error!(error = %err, "backend failed to start; will retry on next backend change");
            }
        }
    }

    fn spawn_rebuild(&self, kind: TargetKind, path: PathBuf) {
        let actions = self.actions.clone();
        tokio::spawn(async move {
            info!(%kind, path = ?path, "rebuilding");
            match actions.rebuild(kind, Mode::Watch).await {
                Ok(()) => info!(%kind, "rebuild finished"),
                Err(err) => error!(%kind, error = %err, "rebuild failed; fix and save again"),
            }
        });
    }

    fn begin_restart(&mut self) {
        let old = self.current.take();
        let spec = self.backend.clone();
        let timings = self.timings;
        self.in_flight = Some(tokio::spawn(restart_sequence(old, spec, timings)));
    }

    fn restart_finished(&mut self, process: Option<ManagedProcess>) {
        self.current = process;
        if self.restart_queued {
            self.restart_queued = false;
            self.begin_restart();
        }
    }

    async fn shutdown(&mut self) {
        self.debouncer.cancel();
        self.restart_queued = false;

        if self.in_flight.is_some() {
            info!("waiting for in-flight backend restart before shutting down");
            let process = join_restart(&mut self.in_flight).await;
            self.in_flight = None;
            self.current = process;
        }

        if let Some(mut process) = self.current.take() {
            info!(pid = ?process.id(), "stopping backend");
            let exit = tokio::select! {
                exit = process.stop(self.timings.grace_period) => exit,
                () = next_shutdown_request(&mut self.event_rx) => {
                    warn!(pid = ?process.id(), "shutdown requested again; killing backend");
                    process.force_kill();
                    process.wait_stopped().await
                }
            };
            info!(code = ?exit.code, "backend stopped");
        }
    }
}

/// Resolves on the next `ShutdownRequested`; other events are dropped.
async fn next_shutdown_request(event_rx: &mut mpsc::Receiver<RuntimeEvent>) {
    while let Some(event) = event_rx.recv().await {
        if matches!(event, RuntimeEvent::ShutdownRequested) {
            return;
        }
        debug!(?event, "ignoring event during shutdown");
    }
    std::future::pending().await
}

/// Stop the old backend, give the OS a moment to release its resources,
/// then start a new one.
async fn restart_sequence(
    old: Option<ManagedProcess>,
    spec: ProcessSpec,
    timings: WatchTimings,
) -> Option<ManagedProcess> {
    info!("restarting backend");
    if let Some(mut process) = old {
        process.stop(timings.grace_period).await;
    }
    sleep(timings.settle).await;

    match ManagedProcess::start(&spec) {
        Ok(process) => Some(process),
        Err(err) => {
            error!(error = %err, "backend failed to start; will retry on next backend change");
            None
        }
    }
}

async fn join_restart(in_flight: &mut Option<RestartTask>) -> Option<ManagedProcess> {
    let Some(handle) = in_flight.as_mut() else {
        return std::future::pending().await;
    };
    match handle.await {
        Ok(process) => process,
        Err(err) => {
            error!(error = %err, "backend restart task failed");
            None
        }
    }
}

/// Spawn a task that turns every Ctrl-C (and SIGTERM on unix) into
/// `RuntimeEvent::ShutdownRequested`.
///
/// The first request starts a graceful shutdown; a repeated one makes the
/// runtime kill the backend without waiting out the grace period.
pub fn spawn_shutdown_listener(tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        let mut signals = match ShutdownSignals::install() {
            Ok(signals) => signals,
            Err(e) => {
                warn!(error = %e, "failed to listen for shutdown signals");
                return;
            }
        };
        loop {
            if let Err(e) = signals.recv().await {
                warn!(error = %e, "shutdown signal listener failed");
                return;
            }
            if tx.send(RuntimeEvent::ShutdownRequested).await.is_err() {
                return;
            }
        }
    });
}

/// Signal streams installed once, so no signal is lost between requests.
struct ShutdownSignals {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            Ok(Self {
                sigint: signal(SignalKind::interrupt())?,
                sigterm: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    async fn recv(&mut self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.sigint.recv() => info!("received SIGINT"),
                _ = self.sigterm.recv() => info!("received SIGTERM"),
            }
            Ok(())
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            info!("received Ctrl+C");
            Ok(())
        }
    }
}
