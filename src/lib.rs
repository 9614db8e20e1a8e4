// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::build::{run_build, run_live_build, RebuildActions};
use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::engine::{spawn_shutdown_listener, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::Result;
use crate::exec::{ProcessSpec, RealToolchain};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::{Mode, TargetKind};
use crate::watch::{plan_watch_trees, spawn_watcher_set};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the release build pipeline (build mode)
/// - initial live build, watchers, signal handling and the runtime (watch mode)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)?;
    let mode = Mode::from_watch_flag(args.watch);

    if args.dry_run {
        print_dry_run(&cfg, mode);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let toolchain = Arc::new(RealToolchain::new(cfg.tools.clone()));
    let cfg = Arc::new(cfg);
    let actions = RebuildActions::new(Arc::clone(&cfg), Arc::clone(&fs), toolchain);

    match mode {
        Mode::Build => run_build(&actions).await,
        Mode::Watch => run_watch(cfg, fs, actions).await,
    }
}

async fn run_watch(
    cfg: Arc<ConfigFile>,
    fs: Arc<dyn FileSystem>,
    actions: RebuildActions,
) -> Result<()> {
    let failures = run_live_build(&actions).await;
    if failures > 0 {
        warn!(failures, "initial build incomplete; continuing in watch mode");
    } else {
        info!("initial build complete");
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let trees = plan_watch_trees(fs.as_ref(), &cfg)?;
    let _watchers = spawn_watcher_set(trees, rt_tx.clone())?;

    spawn_shutdown_listener(rt_tx.clone());

    let options = RuntimeOptions {
        timings: cfg.timings,
    };
    let backend = ProcessSpec::backend_from_config(&cfg);
    let runtime = Runtime::new(options, backend, actions, rt_tx, rt_rx);
    runtime.run().await
}

/// Print the resolved targets and tool command lines; nothing is executed.
fn print_dry_run(cfg: &ConfigFile, mode: Mode) {
    println!("buildwatch dry-run ({mode} mode)");
    println!();

    println!("targets:");
    for target in cfg.targets(mode) {
        println!("  - {}: {} -> {}", target.kind, target.src.display(), target.dest.display());
    }
    if !cfg.assets.ignore.is_empty() {
        println!("  assets ignore: {:?}", cfg.assets.ignore);
    }
    println!();

    println!("commands:");
    let scripts = cfg.target(TargetKind::Scripts, mode);
    let script_input = scripts.src.join(format!("<file>.{}", cfg.scripts.extension));
    let args = cfg.tools.script.render(
        &[("input", script_input.as_path()), ("outdir", scripts.dest.as_path())],
        mode.minify(),
        mode.inline_sourcemap(),
    );
    println!("  script:  {}", cfg.tools.script.display(&args));

    let styles = cfg.target(TargetKind::Styles, mode);
    let style_input = styles.src.join(&cfg.styles.entry);
    let style_output = styles.dest.join(&cfg.styles.output);
    let args = cfg.tools.style.render(
        &[("input", style_input.as_path()), ("output", style_output.as_path())],
        mode.minify(),
        mode.inline_sourcemap(),
    );
    println!("  style:   {}", cfg.tools.style.display(&args));

    match mode {
        Mode::Build => {
            let args = cfg.tools.backend_build.render(
                &[
                    ("entry", cfg.backend.entry.as_path()),
                    ("output", cfg.backend.release_dir.as_path()),
                ],
                false,
                false,
            );
            println!("  backend: {}", cfg.tools.backend_build.display(&args));
            println!("  release dir {} is removed first", cfg.backend.release_dir.display());
        }
        Mode::Watch => {
            let spec = ProcessSpec::backend_from_config(cfg);
            println!("  backend: {spec} (in {})", spec.workdir.display());
            println!(
                "  watching *.{} under {} and {}",
                cfg.backend.extension,
                cfg.backend.src.display(),
                cfg.backend.entry.display()
            );
            println!(
                "  debounce {:?}, settle {:?}, grace {:?}",
                cfg.timings.debounce, cfg.timings.settle, cfg.timings.grace_period
            );
        }
    }

    debug!("dry-run complete (no execution)");
}
