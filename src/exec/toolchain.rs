// src/exec/toolchain.rs

//! External compiler abstraction.
//!
//! Rebuild actions talk to a `Toolchain` instead of spawning compilers
//! directly, so tests can swap in a fake that records invocations.
//!
//! - `RealToolchain` renders the `[tools.*]` command templates and runs them
//!   with inherited stdio, mapping spawn failures to `Launch` and non-zero
//!   exits to `Compile`.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{CommandTemplate, ToolsSection};
use crate::errors::{BuildwatchError, Result};
use crate::types::Mode;

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Which external collaborator an invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolStage {
    Script,
    Style,
    Backend,
}

impl fmt::Display for ToolStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStage::Script => f.write_str("script compile"),
            ToolStage::Style => f.write_str("style compile"),
            ToolStage::Backend => f.write_str("backend compile"),
        }
    }
}

/// Trait abstracting the external compilers.
///
/// Production code uses [`RealToolchain`]; tests provide their own
/// implementation that doesn't spawn real processes.
pub trait Toolchain: Send + Sync {
    /// Compile one script file into `out_dir`.
    fn compile_script<'a>(
        &'a self,
        input: &'a Path,
        out_dir: &'a Path,
        mode: Mode,
    ) -> ToolFuture<'a>;

    /// Compile the entry stylesheet into `output`.
    fn compile_style<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
        mode: Mode,
    ) -> ToolFuture<'a>;

    /// Compile the backend entry point into `output`.
    fn compile_backend<'a>(&'a self, entry: &'a Path, output: &'a Path) -> ToolFuture<'a>;
}

/// Runs the configured command templates.
#[derive(Debug, Clone)]
pub struct RealToolchain {
    tools: ToolsSection,
}

impl RealToolchain {
    pub fn new(tools: ToolsSection) -> Self {
        Self { tools }
    }
}

impl Toolchain for RealToolchain {
    fn compile_script<'a>(
        &'a self,
        input: &'a Path,
        out_dir: &'a Path,
        mode: Mode,
    ) -> ToolFuture<'a> {
        Box::pin(async move {
            let args = self.tools.script.render(
                &[("input", input), ("outdir", out_dir)],
                mode.minify(),
                mode.inline_sourcemap(),
            );
            run_tool(&self.tools.script, args, ToolStage::Script, input).await
        })
    }

    fn compile_style<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
        mode: Mode,
    ) -> ToolFuture<'a> {
        Box::pin(async move {
            let args = self.tools.style.render(
                &[("input", input), ("output", output)],
                mode.minify(),
                mode.inline_sourcemap(),
            );
            run_tool(&self.tools.style, args, ToolStage::Style, input).await
        })
    }

    fn compile_backend<'a>(&'a self, entry: &'a Path, output: &'a Path) -> ToolFuture<'a> {
        Box::pin(async move {
            let args = self
                .tools
                .backend_build
                .render(&[("entry", entry), ("output", output)], false, false);
            run_tool(&self.tools.backend_build, args, ToolStage::Backend, entry).await
        })
    }
}

async fn run_tool(
    template: &CommandTemplate,
    args: Vec<String>,
    stage: ToolStage,
    input: &Path,
) -> Result<()> {
    let cmdline = template.display(&args);
    info!(%stage, cmd = %cmdline, "running external tool");

    let status = Command::new(&template.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|source| BuildwatchError::Launch {
            program: template.program.clone(),
            source,
        })?;

    debug!(%stage, ?status, "external tool finished");

    if status.success() {
        Ok(())
    } else {
        Err(BuildwatchError::compile(
            &stage.to_string(),
            input,
            format!("`{cmdline}` exited with {status}"),
        ))
    }
}
