// src/build/actions.rs

//! Rebuild actions: thin adapters from a `BuildTarget` to the toolchain or
//! the filesystem. They hold no state between calls.

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::build::mirror::{collect_files, plan_script_jobs};
use crate::config::{BuildTarget, ConfigFile};
use crate::errors::{BuildwatchError, Result};
use crate::exec::Toolchain;
use crate::fs::FileSystem;
use crate::types::{Mode, TargetKind};

/// Everything a rebuild needs, shareable across spawned rebuild tasks.
#[derive(Clone)]
pub struct RebuildActions {
    config: Arc<ConfigFile>,
    fs: Arc<dyn FileSystem>,
    toolchain: Arc<dyn Toolchain>,
}

impl std::fmt::Debug for RebuildActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebuildActions")
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl RebuildActions {
    pub fn new(
        config: Arc<ConfigFile>,
        fs: Arc<dyn FileSystem>,
        toolchain: Arc<dyn Toolchain>,
    ) -> Self {
        Self {
            config,
            fs,
            toolchain,
        }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Rebuild one frontend target for `mode`.
    pub async fn rebuild(&self, kind: TargetKind, mode: Mode) -> Result<()> {
        let target = self.config.target(kind, mode);
        match kind {
            TargetKind::Scripts => self.compile_scripts(&target, mode).await.map(|_| ()),
            TargetKind::Styles => self.compile_styles(&target, mode).await,
            TargetKind::Assets => self.copy_assets(&target).await.map(|_| ()),
        }
    }

    /// Compile every script below `target.src` into the mirrored location
    /// below `target.dest`. Stops at the first failing file; outputs already
    /// written stay in place.
    ///
    /// Returns the number of files compiled.
    pub async fn compile_scripts(&self, target: &BuildTarget, mode: Mode) -> Result<usize> {
        if !self.fs.exists(&target.src) {
            warn!(src = ?target.src, "script source directory missing; skipping");
            return Ok(0);
        }
        self.fs.create_dir_all(&target.dest)?;

        let files = collect_files(self.fs.as_ref(), &target.src)?;
        let jobs = plan_script_jobs(
            &target.src,
            &target.dest,
            &files,
            &self.config.scripts.extension,
        );
        debug!(count = jobs.len(), src = ?target.src, "planned script jobs");

        for job in &jobs {
            self.fs.create_dir_all(&job.out_dir)?;
            self.toolchain
                .compile_script(&job.input, &job.out_dir, mode)
                .await?;
        }

        info!(count = jobs.len(), dest = ?target.dest, "scripts compiled");
        Ok(jobs.len())
    }

    /// Compile the entry stylesheet into the fixed output file.
    pub async fn compile_styles(&self, target: &BuildTarget, mode: Mode) -> Result<()> {
        if !self.fs.exists(&target.src) {
            warn!(src = ?target.src, "style source directory missing; skipping");
            return Ok(());
        }
        self.fs.create_dir_all(&target.dest)?;

        let input = target.src.join(&self.config.styles.entry);
        let output = target.dest.join(&self.config.styles.output);
        self.toolchain.compile_style(&input, &output, mode).await?;

        info!(output = ?output, "styles compiled");
        Ok(())
    }

    /// Copy the asset tree on the blocking pool.
    pub async fn copy_assets(&self, target: &BuildTarget) -> Result<usize> {
        let fs = Arc::clone(&self.fs);
        let src = target.src.clone();
        let dest = target.dest.clone();
        let ignore = self.config.assets.ignore.clone();

        let copied = tokio::task::spawn_blocking(move || {
            copy_assets(fs.as_ref(), &src, &dest, &ignore)
        })
        .await
        .map_err(|e| BuildwatchError::Other(anyhow!("asset copy task failed: {e}")))??;

        info!(count = copied, dest = ?target.dest, "assets copied");
        Ok(copied)
    }

    /// Compile the backend binary into the release directory.
    pub async fn compile_backend(&self) -> Result<()> {
        let release = &self.config.backend.release_dir;
        self.fs.create_dir_all(release)?;
        self.toolchain
            .compile_backend(&self.config.backend.entry, release)
            .await?;
        info!(output = ?release, "backend compiled");
        Ok(())
    }

    /// Remove the release directory.
    pub fn clean_release(&self) -> Result<()> {
        let release = &self.config.backend.release_dir;
        self.fs.remove_dir_all(release)?;
        debug!(dir = ?release, "release directory removed");
        Ok(())
    }
}

/// Recursively copy `src` into `dest`, skipping top-level entries named in
/// `ignore`. Nested entries with an ignored name are still copied. Existing
/// files are overwritten.
///
/// Returns the number of files copied. A missing `src` copies nothing.
pub fn copy_assets(
    fs: &dyn FileSystem,
    src: &Path,
    dest: &Path,
    ignore: &[String],
) -> Result<usize> {
    if !fs.exists(src) {
        warn!(src = ?src, "asset source directory missing; skipping");
        return Ok(0);
    }

    fs.create_dir_all(dest).map_err(|e| BuildwatchError::copy(dest, e))?;

    let mut copied = 0;
    for entry in fs.read_dir(src).map_err(|e| BuildwatchError::copy(src, e))? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        if ignore.iter().any(|i| name.to_string_lossy() == i.as_str()) {
            debug!(entry = ?entry, "ignored top-level asset entry");
            continue;
        }
        copy_entry(fs, &entry, &dest.join(name), &mut copied)?;
    }
    Ok(copied)
}

fn copy_entry(fs: &dyn FileSystem, from: &Path, to: &Path, copied: &mut usize) -> Result<()> {
    if fs.is_dir(from) {
        fs.create_dir_all(to)
            .map_err(|e| BuildwatchError::copy(to, e))?;
        for child in fs.read_dir(from).map_err(|e| BuildwatchError::copy(from, e))? {
            let Some(name) = child.file_name() else {
                continue;
            };
            copy_entry(fs, &child, &to.join(name), copied)?;
        }
    } else {
        fs.copy_file(from, to)
            .map_err(|e| BuildwatchError::copy(from, e))?;
        *copied += 1;
    }
    Ok(())
}
