// src/watch/mod.rs

//! File watching for watch mode.
//!
//! This module is responsible for:
//! - Deciding which trees and files are watched, and with which filter.
//! - Wiring up one cross-platform watcher (`notify`) per tree.
//! - Turning filesystem changes into `RuntimeEvent`s.
//!
//! It does not rebuild or restart anything itself.

pub mod subscription;
pub mod watcher;

pub use subscription::{TreeFilter, WatchAction, WatchSubscription};
pub use watcher::{plan_watch_trees, spawn_tree_watcher, spawn_watcher_set, WatchTree, WatcherSet};
