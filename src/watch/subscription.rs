// src/watch/subscription.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::engine::RuntimeEvent;
use crate::types::TargetKind;

/// What a matching change should cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    Rebuild(TargetKind),
    RestartBackend,
}

/// Predicate over a path relative to the subscription root (forward
/// slashes, e.g. `"sub/b.ts"`).
#[derive(Clone)]
pub enum TreeFilter {
    /// Files with the given extension, at any depth.
    Extension { ext: String, glob: GlobSet },
    /// Anything whose first path component is not in the list.
    NotIgnored(Vec<String>),
    /// Every event; used for single-file subscriptions.
    Any,
}

impl fmt::Debug for TreeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeFilter::Extension { ext, .. } => f.debug_tuple("Extension").field(ext).finish(),
            TreeFilter::NotIgnored(names) => f.debug_tuple("NotIgnored").field(names).finish(),
            TreeFilter::Any => f.write_str("Any"),
        }
    }
}

impl TreeFilter {
    pub fn extension(ext: &str) -> Result<Self> {
        let pattern = format!("**/*.{ext}");
        let glob = Glob::new(&pattern)
            .with_context(|| format!("invalid extension pattern {pattern:?}"))?;
        let mut builder = GlobSetBuilder::new();
        builder.add(glob);
        let glob = builder
            .build()
            .with_context(|| format!("building glob set for {pattern:?}"))?;
        Ok(TreeFilter::Extension {
            ext: ext.to_string(),
            glob,
        })
    }

    pub fn not_ignored(names: &[String]) -> Self {
        TreeFilter::NotIgnored(names.to_vec())
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        match self {
            TreeFilter::Any => true,
            // An event on the root directory itself names no file.
            _ if rel_path.is_empty() => false,
            TreeFilter::Extension { glob, .. } => glob.is_match(rel_path),
            TreeFilter::NotIgnored(names) => {
                let first = rel_path.split('/').next().unwrap_or(rel_path);
                !names.iter().any(|n| n == first)
            }
        }
    }
}

/// One registered watch: a root, whether it is watched recursively, which
/// changes below it matter and what they trigger.
#[derive(Debug, Clone)]
pub struct WatchSubscription {
    pub root: PathBuf,
    pub recursive: bool,
    pub filter: TreeFilter,
    pub action: WatchAction,
}

impl WatchSubscription {
    pub fn tree(root: impl Into<PathBuf>, filter: TreeFilter, action: WatchAction) -> Self {
        Self {
            root: root.into(),
            recursive: true,
            filter,
            action,
        }
    }

    pub fn file(path: impl Into<PathBuf>, action: WatchAction) -> Self {
        Self {
            root: path.into(),
            recursive: false,
            filter: TreeFilter::Any,
            action,
        }
    }

    /// Path of `path` relative to the root with forward slashes, or `None`
    /// if it is not below the root.
    pub fn relative(&self, path: &Path) -> Option<String> {
        if let Ok(rel) = path.strip_prefix(&self.root) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }

        // Event paths and roots may disagree on symlinked prefixes
        // (e.g. /private/var vs /var on macOS).
        let (Ok(root), Ok(path)) = (self.root.canonicalize(), path.canonicalize()) else {
            return None;
        };
        path.strip_prefix(&root)
            .ok()
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
    }

    /// The runtime event a change at `path` produces, if any.
    pub fn event_for(&self, path: &Path) -> Option<RuntimeEvent> {
        let rel = self.relative(path)?;
        if !self.filter.matches(&rel) {
            return None;
        }
        let path = path.to_path_buf();
        Some(match self.action {
            WatchAction::Rebuild(target) => RuntimeEvent::RebuildRequested { target, path },
            WatchAction::RestartBackend => RuntimeEvent::BackendSourceChanged { path },
        })
    }
}
