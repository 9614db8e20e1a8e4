// tests/build_pipeline.rs

mod common;

use std::path::Path;
use std::sync::Arc;

use buildwatch::build::{run_build, run_live_build, RebuildActions};
use buildwatch::config::ConfigFile;
use buildwatch::errors::BuildwatchError;
use buildwatch::exec::ToolStage;
use buildwatch::fs::RealFileSystem;
use buildwatch::types::Mode;
use common::builders::ConfigFileBuilder;
use common::fake_toolchain::{FakeToolchain, MINIFIED_MARKER, SOURCEMAP_MARKER};
use common::write_file;
use tempfile::TempDir;

fn actions(cfg: &ConfigFile, toolchain: &FakeToolchain) -> RebuildActions {
    RebuildActions::new(
        Arc::new(cfg.clone()),
        Arc::new(RealFileSystem),
        Arc::new(toolchain.clone()),
    )
}

/// Scripts, one stylesheet, assets (with an ignored top-level `js` dir and a
/// nested `css` dir) and a backend entry point.
fn sample_project(root: &Path) -> ConfigFile {
    let cfg = ConfigFileBuilder::rooted_at(root).build();
    write_file(&cfg.scripts.src.join("a.ts"), "export const a = 1;");
    write_file(&cfg.scripts.src.join("sub/b.ts"), "export const b = 2;");
    write_file(&cfg.scripts.src.join("README.md"), "not a script");
    write_file(&cfg.styles.src.join("main.css"), "@import 'tailwindcss';");
    write_file(&cfg.assets.src.join("favicon.ico"), "icon");
    write_file(&cfg.assets.src.join("js/legacy.js"), "stale");
    write_file(&cfg.assets.src.join("img/css/nested.css"), "kept");
    write_file(&cfg.backend.entry, "package main");
    cfg
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("reading {path:?}: {e}"))
}

#[tokio::test]
async fn release_build_mirrors_scripts_and_minifies() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = sample_project(dir.path());
    let toolchain = FakeToolchain::writing_outputs();

    run_build(&actions(&cfg, &toolchain)).await.unwrap();

    let a = read(&cfg.scripts.dest.join("a.js"));
    let b = read(&cfg.scripts.dest.join("sub/b.js"));
    assert!(a.starts_with(MINIFIED_MARKER));
    assert!(b.starts_with(MINIFIED_MARKER));
    assert!(!a.contains(SOURCEMAP_MARKER));
    assert!(!cfg.scripts.dest.join("README.js").exists());

    let scripts = toolchain.calls_for(ToolStage::Script);
    assert_eq!(scripts.len(), 2);
    assert_eq!(scripts[0].input, cfg.scripts.src.join("a.ts"));
    assert_eq!(scripts[0].output, cfg.scripts.dest);
    assert_eq!(scripts[1].input, cfg.scripts.src.join("sub/b.ts"));
    assert_eq!(scripts[1].output, cfg.scripts.dest.join("sub"));
    assert!(scripts.iter().all(|c| c.mode == Some(Mode::Build)));
}

#[tokio::test]
async fn release_build_runs_stages_in_order() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = sample_project(dir.path());
    write_file(&cfg.backend.release_dir.join("stale.txt"), "old release");
    let toolchain = FakeToolchain::writing_outputs();

    run_build(&actions(&cfg, &toolchain)).await.unwrap();

    let stages: Vec<ToolStage> = toolchain.calls().iter().map(|c| c.stage).collect();
    assert_eq!(
        stages,
        vec![
            ToolStage::Script,
            ToolStage::Script,
            ToolStage::Style,
            ToolStage::Backend
        ]
    );

    // Clean ran first.
    assert!(!cfg.backend.release_dir.join("stale.txt").exists());

    let style = &toolchain.calls_for(ToolStage::Style)[0];
    assert_eq!(style.input, cfg.styles.src.join("main.css"));
    assert_eq!(style.output, cfg.styles.dest.join("main.css"));
    assert!(cfg.styles.dest.join("main.css").exists());

    let backend = &toolchain.calls_for(ToolStage::Backend)[0];
    assert_eq!(backend.input, cfg.backend.entry);
    assert_eq!(backend.output, cfg.backend.release_dir);
}

#[tokio::test]
async fn release_build_copies_assets_except_ignored_top_level_dirs() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = sample_project(dir.path());
    let toolchain = FakeToolchain::writing_outputs();

    run_build(&actions(&cfg, &toolchain)).await.unwrap();

    assert_eq!(read(&cfg.assets.dest.join("favicon.ico")), "icon");
    assert_eq!(read(&cfg.assets.dest.join("img/css/nested.css")), "kept");
    assert!(!cfg.assets.dest.join("js/legacy.js").exists());
    // The compiled scripts share the ignored directory name.
    assert!(cfg.assets.dest.join("js/a.js").exists());
}

#[tokio::test]
async fn style_failure_aborts_before_assets_and_backend() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = sample_project(dir.path());
    let toolchain = FakeToolchain::writing_outputs();
    toolchain.fail_on(ToolStage::Style);

    let result = run_build(&actions(&cfg, &toolchain)).await;

    match result {
        Err(BuildwatchError::Compile { stage, input, .. }) => {
            assert_eq!(stage, "style compile");
            assert_eq!(input, cfg.styles.src.join("main.css"));
        }
        other => panic!("Expected Compile error, got: {:?}", other),
    }
    assert!(!cfg.assets.dest.join("favicon.ico").exists());
    assert!(toolchain.calls_for(ToolStage::Backend).is_empty());
}

#[tokio::test]
async fn script_failure_stops_at_first_file() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = sample_project(dir.path());
    let toolchain = FakeToolchain::new();
    toolchain.fail_on(ToolStage::Script);

    let result = run_build(&actions(&cfg, &toolchain)).await;

    assert!(matches!(result, Err(BuildwatchError::Compile { .. })));
    assert_eq!(toolchain.calls().len(), 1);
}

#[tokio::test]
async fn missing_source_dirs_are_skipped() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = ConfigFileBuilder::rooted_at(dir.path()).build();
    let toolchain = FakeToolchain::new();

    run_build(&actions(&cfg, &toolchain)).await.unwrap();

    let stages: Vec<ToolStage> = toolchain.calls().iter().map(|c| c.stage).collect();
    assert_eq!(stages, vec![ToolStage::Backend]);
    assert!(cfg.backend.release_dir.is_dir());
}

#[tokio::test]
async fn live_build_writes_sourcemaps_into_live_dirs() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = sample_project(dir.path());
    let toolchain = FakeToolchain::writing_outputs();

    let failures = run_live_build(&actions(&cfg, &toolchain)).await;

    assert_eq!(failures, 0);
    let a = read(&cfg.scripts.live_dest.join("a.js"));
    assert!(a.contains(SOURCEMAP_MARKER));
    assert!(!a.starts_with(MINIFIED_MARKER));
    assert!(cfg.scripts.live_dest.join("sub/b.js").exists());
    assert!(cfg.styles.live_dest.join("main.css").exists());
    assert!(cfg.assets.live_dest.join("favicon.ico").exists());

    assert!(!cfg.backend.release_dir.exists());
    assert!(toolchain.calls_for(ToolStage::Backend).is_empty());
}

#[tokio::test]
async fn live_build_keeps_going_after_a_failure() {
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let cfg = sample_project(dir.path());
    let toolchain = FakeToolchain::writing_outputs();
    toolchain.fail_on(ToolStage::Script);

    let failures = run_live_build(&actions(&cfg, &toolchain)).await;

    assert_eq!(failures, 1);
    assert!(cfg.styles.live_dest.join("main.css").exists());
    assert!(cfg.assets.live_dest.join("favicon.ico").exists());
}
