use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use buildwatch::errors::{BuildwatchError, Result};
use buildwatch::exec::{ToolFuture, ToolStage, Toolchain};
use buildwatch::types::Mode;

/// Marker a written script output starts with in build mode.
pub const MINIFIED_MARKER: &str = "/* minified */";
/// Marker a written script output ends with in watch mode.
pub const SOURCEMAP_MARKER: &str = "//# sourceMappingURL=data:application/json;base64,";

/// One recorded compiler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: ToolStage,
    pub input: PathBuf,
    /// Output directory for scripts, output file otherwise.
    pub output: PathBuf,
    /// `None` for the backend compile, which has no mode.
    pub mode: Option<Mode>,
}

/// A fake toolchain that:
/// - records every invocation in order
/// - fails the stages it was told to fail, with a `Compile` error
/// - optionally writes plausible output files so tests can inspect the tree.
#[derive(Debug, Clone, Default)]
pub struct FakeToolchain {
    calls: Arc<Mutex<Vec<Invocation>>>,
    failing: Arc<Mutex<HashSet<ToolStage>>>,
    write_outputs: bool,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write output files to the real filesystem on success.
    pub fn writing_outputs() -> Self {
        Self {
            write_outputs: true,
            ..Self::default()
        }
    }

    pub fn fail_on(&self, stage: ToolStage) {
        self.failing.lock().unwrap().insert(stage);
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, stage: ToolStage) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.stage == stage)
            .collect()
    }

    fn record(
        &self,
        stage: ToolStage,
        input: &Path,
        output: &Path,
        mode: Option<Mode>,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(Invocation {
            stage,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            mode,
        });

        if self.failing.lock().unwrap().contains(&stage) {
            return Err(BuildwatchError::compile(
                &stage.to_string(),
                input,
                "exited with code 1",
            ));
        }
        Ok(())
    }
}

impl Toolchain for FakeToolchain {
    fn compile_script<'a>(
        &'a self,
        input: &'a Path,
        out_dir: &'a Path,
        mode: Mode,
    ) -> ToolFuture<'a> {
        Box::pin(async move {
            self.record(ToolStage::Script, input, out_dir, Some(mode))?;
            if self.write_outputs {
                let stem = input.file_stem().context("script input has no file name")?;
                let mut out = out_dir.join(stem);
                out.set_extension("js");
                let body = match mode {
                    Mode::Build => format!("{MINIFIED_MARKER}export{{}};"),
                    Mode::Watch => format!("export {{}};\n{SOURCEMAP_MARKER}e30=\n"),
                };
                std::fs::write(&out, body)?;
            }
            Ok(())
        })
    }

    fn compile_style<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
        mode: Mode,
    ) -> ToolFuture<'a> {
        Box::pin(async move {
            self.record(ToolStage::Style, input, output, Some(mode))?;
            if self.write_outputs {
                std::fs::write(output, "body{}")?;
            }
            Ok(())
        })
    }

    fn compile_backend<'a>(&'a self, entry: &'a Path, output: &'a Path) -> ToolFuture<'a> {
        Box::pin(async move { self.record(ToolStage::Backend, entry, output, None) })
    }
}
