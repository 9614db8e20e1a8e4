// src/build/mirror.rs

//! Directory mirroring for the script pipeline.
//!
//! Walking the tree ([`collect_files`]) is separate from deciding what to
//! compile where ([`plan_script_jobs`]), which is a pure function over
//! relative paths.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::fs::FileSystem;

/// One script compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptJob {
    /// Source file, `src_root/rel`.
    pub input: PathBuf,
    /// Mirrored destination directory handed to the compiler.
    pub out_dir: PathBuf,
    /// File the compiler is expected to produce (`.js` next to `out_dir`).
    pub output: PathBuf,
}

/// Recursively list every file under `root`, as paths relative to `root`,
/// sorted.
pub fn collect_files(fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    walk(fs, root, Path::new(""), &mut out)?;
    out.sort();
    Ok(out)
}

fn walk(fs: &dyn FileSystem, dir: &Path, rel: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs.read_dir(dir)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let rel_entry = rel.join(name);
        if fs.is_dir(&entry) {
            walk(fs, &entry, &rel_entry, out)?;
        } else {
            out.push(rel_entry);
        }
    }
    Ok(())
}

/// True if `path` has exactly the extension `ext` (given without the dot).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// Map relative source paths to compiler jobs.
///
/// Files without `extension` are skipped; directory structure below
/// `src_root` is reproduced below `dest_root`.
pub fn plan_script_jobs<I, P>(
    src_root: &Path,
    dest_root: &Path,
    rel_paths: I,
    extension: &str,
) -> Vec<ScriptJob>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    rel_paths
        .into_iter()
        .filter(|rel| has_extension(rel.as_ref(), extension))
        .map(|rel| {
            let rel = rel.as_ref();
            let out_dir = match rel.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => dest_root.join(parent),
                _ => dest_root.to_path_buf(),
            };
            ScriptJob {
                input: src_root.join(rel),
                output: dest_root.join(rel).with_extension("js"),
                out_dir,
            }
        })
        .collect()
}
