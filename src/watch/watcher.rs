// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::build::mirror::{collect_files, has_extension};
use crate::config::ConfigFile;
use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;
use crate::types::{Mode, TargetKind};
use crate::watch::subscription::{TreeFilter, WatchAction, WatchSubscription};

/// A group of subscriptions served by one OS watcher.
#[derive(Debug, Clone)]
pub struct WatchTree {
    pub name: &'static str,
    pub subscriptions: Vec<WatchSubscription>,
}

/// Keeps every tree watcher alive. Dropping it stops file watching.
pub struct WatcherSet {
    watchers: Vec<RecommendedWatcher>,
}

impl std::fmt::Debug for WatcherSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherSet")
            .field("watchers", &self.watchers.len())
            .finish()
    }
}

/// Work out what watch mode observes.
///
/// Frontend trees are watched recursively with a filter per target. Backend
/// sources are discovered once, here, and each file gets its own
/// non-recursive subscription; files created later are not picked up. Roots
/// that do not exist are skipped with a warning.
pub fn plan_watch_trees(fs: &dyn FileSystem, cfg: &ConfigFile) -> Result<Vec<WatchTree>> {
    let mut trees = Vec::new();

    for kind in TargetKind::ALL {
        let target = cfg.target(kind, Mode::Watch);
        if !fs.is_dir(&target.src) {
            warn!(%kind, src = ?target.src, "watch root missing; not watching");
            continue;
        }
        let filter = match kind {
            TargetKind::Scripts => TreeFilter::extension(&cfg.scripts.extension)?,
            TargetKind::Styles => TreeFilter::extension(&cfg.styles.extension)?,
            TargetKind::Assets => TreeFilter::not_ignored(&cfg.assets.ignore),
        };
        trees.push(WatchTree {
            name: tree_name(kind),
            subscriptions: vec![WatchSubscription::tree(
                target.src,
                filter,
                WatchAction::Rebuild(kind),
            )],
        });
    }

    let mut backend_files: Vec<PathBuf> = Vec::new();
    if fs.is_dir(&cfg.backend.src) {
        backend_files.extend(
            collect_files(fs, &cfg.backend.src)?
                .into_iter()
                .filter(|rel| has_extension(rel, &cfg.backend.extension))
                .map(|rel| cfg.backend.src.join(rel)),
        );
    } else {
        warn!(src = ?cfg.backend.src, "backend source dir missing; not watching");
    }
    if fs.exists(&cfg.backend.entry) && !backend_files.contains(&cfg.backend.entry) {
        backend_files.push(cfg.backend.entry.clone());
    }

    if !backend_files.is_empty() {
        debug!(count = backend_files.len(), "backend files discovered");
        trees.push(WatchTree {
            name: "backend",
            subscriptions: backend_files
                .into_iter()
                .map(|path| WatchSubscription::file(path, WatchAction::RestartBackend))
                .collect(),
        });
    }

    Ok(trees)
}

fn tree_name(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Scripts => "scripts",
        TargetKind::Styles => "styles",
        TargetKind::Assets => "assets",
    }
}

/// Start one OS watcher per tree, all feeding `runtime_tx`.
pub fn spawn_watcher_set(
    trees: Vec<WatchTree>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherSet> {
    let mut watchers = Vec::with_capacity(trees.len());
    for tree in trees {
        if tree.subscriptions.is_empty() {
            continue;
        }
        watchers.push(spawn_tree_watcher(tree, runtime_tx.clone())?);
    }
    info!(count = watchers.len(), "file watchers started");
    Ok(WatcherSet { watchers })
}

/// Register every subscription of `tree` on a single notify watcher and
/// forward matching changes to the runtime.
///
/// Access events (opens and reads) are dropped: the compilers read the very
/// files being watched.
pub fn spawn_tree_watcher(
    tree: WatchTree,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<RecommendedWatcher> {
    let name = tree.name;

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!(tree = name, "watch loop gone; dropping notify event");
                }
            }
            Err(err) => warn!(tree = name, error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    let mut subscriptions = Vec::with_capacity(tree.subscriptions.len());
    for mut sub in tree.subscriptions {
        // Canonicalize once so event paths and roots agree.
        sub.root = sub.root.canonicalize().unwrap_or_else(|_| sub.root.clone());
        let mode = if sub.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        match watcher.watch(&sub.root, mode) {
            Ok(()) => subscriptions.push(sub),
            Err(err) => warn!(tree = name, root = ?sub.root, error = %err, "failed to watch path"),
        }
    }

    info!(tree = name, paths = subscriptions.len(), "file watcher started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if event.kind.is_access() {
                continue;
            }
            debug!(tree = name, ?event, "received notify event");

            for path in &event.paths {
                let Some(runtime_event) = subscriptions.iter().find_map(|sub| sub.event_for(path))
                else {
                    continue;
                };
                if runtime_tx.send(runtime_event).await.is_err() {
                    debug!(tree = name, "runtime gone; stopping watch loop");
                    return;
                }
            }
        }
        debug!(tree = name, "watch loop finished");
    });

    Ok(watcher)
}
