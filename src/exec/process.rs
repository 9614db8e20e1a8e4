// src/exec/process.rs

//! Supervised backend process.
//!
//! The `Child` is moved into a background task that waits for it to exit and
//! publishes the exit status on a `watch` channel. `ManagedProcess` keeps the
//! receiving end (so the stopped state can be awaited or checked without a
//! lock) plus a one-shot channel asking that task to force-kill the child.

use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::errors::{BuildwatchError, Result};
use crate::exec::signal::send_terminate;

/// What to launch for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub workdir: PathBuf,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            workdir: workdir.into(),
        }
    }

    /// Backend runtime command from `[tools.backend_run]`.
    pub fn backend_from_config(cfg: &ConfigFile) -> Self {
        let args = cfg
            .tools
            .backend_run
            .render(&[("entry", cfg.backend.entry.as_path())], false, false);
        Self::new(
            cfg.tools.backend_run.program.clone(),
            args,
            cfg.backend.workdir.clone(),
        )
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Lifecycle of a started process.
///
/// There is no separate "starting" state on a handle: `start` spawns
/// synchronously, so a `ManagedProcess` only exists once the OS has a pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Stopping,
    Stopped,
}

/// Exit information recorded by the wait task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was terminated by a signal or the status
    /// could not be read.
    pub code: Option<i32>,
    pub success: bool,
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }
}

pub struct ManagedProcess {
    program: String,
    pid: Option<u32>,
    stopping: bool,
    /// Consumed on the first force-kill request.
    kill_tx: Option<oneshot::Sender<()>>,
    exit_rx: watch::Receiver<Option<ProcessExit>>,
}

impl fmt::Debug for ManagedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedProcess")
            .field("program", &self.program)
            .field("pid", &self.pid)
            .field("state", &self.state())
            .finish()
    }
}

impl ManagedProcess {
    /// Launch `spec` with inherited stdio.
    ///
    /// Fails with [`BuildwatchError::Launch`] if the executable cannot be
    /// spawned.
    pub fn start(spec: &ProcessSpec) -> Result<Self> {
        info!(cmd = %spec, workdir = ?spec.workdir, "starting backend process");

        let child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.workdir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BuildwatchError::Launch {
                program: spec.program.clone(),
                source,
            })?;

        let pid = child.id();
        info!(?pid, "backend process started");

        let (exit_tx, exit_rx) = watch::channel(None);
        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        tokio::spawn(wait_for_exit(child, pid, kill_rx, exit_tx));

        Ok(Self {
            program: spec.program.clone(),
            pid,
            stopping: false,
            kill_tx: Some(kill_tx),
            exit_rx,
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        if self.has_exited() {
            ProcessState::Stopped
        } else if self.stopping {
            ProcessState::Stopping
        } else {
            ProcessState::Running
        }
    }

    pub fn has_exited(&self) -> bool {
        self.exit_rx.borrow().is_some()
    }

    /// Exit status, once the OS has reported it.
    pub fn exit_status(&self) -> Option<ProcessExit> {
        *self.exit_rx.borrow()
    }

    /// Wait until the process has exited.
    pub async fn wait_stopped(&self) -> ProcessExit {
        let mut rx = self.exit_rx.clone();
        let result = rx.wait_for(|exit| exit.is_some()).await.map(|exit| *exit);
        match result {
            Ok(Some(exit)) => exit,
            // The wait task always publishes before finishing; a closed
            // channel means it was torn down with the runtime.
            _ => ProcessExit {
                code: None,
                success: false,
            },
        }
    }

    /// Wait for exit, giving up after `grace`.
    pub async fn wait_with_grace(&self, grace: Duration) -> Result<ProcessExit> {
        timeout(grace, self.wait_stopped())
            .await
            .map_err(|_| BuildwatchError::ProcessStopTimeout {
                pid: self.pid,
                grace,
            })
    }

    /// Stop the process: polite request first, forceful kill after `grace`.
    ///
    /// Never returns before the process is confirmed exited.
    pub async fn stop(&mut self, grace: Duration) -> ProcessExit {
        let Some(pid) = self.pid else {
            if let Some(exit) = self.exit_status() {
                return exit;
            }
            self.stopping = true;
            warn!("process has no pid; killing directly");
            return self.kill_and_wait().await;
        };

        // The wait task reaps the child as soon as it exits, after which the
        // pid may be reused. Nothing awaits between this check and spawning
        // `kill`, but the spawn itself still leaves a short window.
        if let Some(exit) = self.exit_status() {
            debug!(pid, "process already exited; nothing to stop");
            return exit;
        }
        self.stopping = true;

        info!(pid, ?grace, "sending graceful termination request");
        if let Err(err) = send_terminate(pid).await {
            if let Some(exit) = self.exit_status() {
                debug!(pid, "process exited before termination request arrived");
                return exit;
            }
            warn!(pid, error = %err, "graceful termination request failed; killing");
            return self.kill_and_wait().await;
        }

        match self.wait_with_grace(grace).await {
            Ok(exit) => {
                info!(pid, code = ?exit.code, "process exited gracefully");
                exit
            }
            Err(err) => {
                warn!(pid, error = %err, "graceful stop timed out; killing");
                self.kill_and_wait().await
            }
        }
    }

    /// Ask the wait task to kill the child.
    pub fn force_kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            // The wait task may have already finished on its own.
            let _ = tx.send(());
        }
    }

    async fn kill_and_wait(&mut self) -> ProcessExit {
        self.force_kill();
        let exit = self.wait_stopped().await;
        info!(pid = ?self.pid, code = ?exit.code, "process killed");
        exit
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if !self.has_exited() {
            warn!(pid = ?self.pid, "ManagedProcess dropped while still running; killing");
            self.force_kill();
        }
    }
}

/// Background task: owns `child`, records its exit status.
///
/// Ends either when the child exits on its own or after killing it on
/// request (or when the handle is dropped and the kill channel closes).
async fn wait_for_exit(
    mut child: Child,
    pid: Option<u32>,
    kill_rx: oneshot::Receiver<()>,
    exit_tx: watch::Sender<Option<ProcessExit>>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = kill_rx => {
            if let Err(e) = child.start_kill() {
                debug!(?pid, error = %e, "kill failed; process probably already exited");
            }
            child.wait().await
        }
    };

    let exit = match status {
        Ok(status) => ProcessExit::from(status),
        Err(e) => {
            warn!(?pid, error = %e, "failed to read process exit status");
            ProcessExit {
                code: None,
                success: false,
            }
        }
    };

    info!(?pid, code = ?exit.code, success = exit.success, "backend process exited");
    exit_tx.send_replace(Some(exit));
}
