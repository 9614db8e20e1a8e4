// src/exec/signal.rs

//! Polite termination requests for child processes.
//!
//! `tokio::process::Child` only exposes a forceful kill, so the graceful
//! request goes through the platform's own tool: `kill -TERM` on unix and
//! `taskkill` (without `/F`) on windows.

use std::process::Stdio;

use anyhow::anyhow;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{BuildwatchError, Result};

/// Ask process `pid` to exit.
///
/// Returns an error if the request could not be delivered, which includes
/// the case where the process no longer exists.
pub async fn send_terminate(pid: u32) -> Result<()> {
    let (program, args) = terminate_command(pid);
    debug!(pid, %program, ?args, "sending termination request");

    let status = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| BuildwatchError::Launch {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(BuildwatchError::Other(anyhow!(
            "termination request for pid {pid} failed ({status})"
        )))
    }
}

#[cfg(unix)]
fn terminate_command(pid: u32) -> (&'static str, Vec<String>) {
    ("kill", vec!["-TERM".to_string(), pid.to_string()])
}

#[cfg(not(unix))]
fn terminate_command(pid: u32) -> (&'static str, Vec<String>) {
    (
        "taskkill",
        vec!["/PID".to_string(), pid.to_string(), "/T".to_string()],
    )
}
