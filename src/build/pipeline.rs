// src/build/pipeline.rs

use std::fmt;

use tracing::{error, info};

use crate::build::actions::RebuildActions;
use crate::errors::Result;
use crate::types::{Mode, TargetKind};

/// Stages of a release build, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clean,
    Scripts,
    Styles,
    Assets,
    Backend,
}

impl Stage {
    pub const PIPELINE: [Stage; 5] = [
        Stage::Clean,
        Stage::Scripts,
        Stage::Styles,
        Stage::Assets,
        Stage::Backend,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Clean => f.write_str("clean"),
            Stage::Scripts => f.write_str("scripts"),
            Stage::Styles => f.write_str("styles"),
            Stage::Assets => f.write_str("assets"),
            Stage::Backend => f.write_str("backend"),
        }
    }
}

/// One-shot release build.
///
/// Runs every stage in order; the first failure aborts the remaining stages
/// and is returned to the caller.
pub async fn run_build(actions: &RebuildActions) -> Result<()> {
    info!(
        release_dir = ?actions.config().backend.release_dir,
        "starting release build"
    );

    for stage in Stage::PIPELINE {
        info!(%stage, "build stage starting");
        if let Err(err) = run_stage(actions, stage).await {
            error!(%stage, error = %err, "build stage failed; aborting");
            return Err(err);
        }
    }

    info!("release build complete");
    Ok(())
}

async fn run_stage(actions: &RebuildActions, stage: Stage) -> Result<()> {
    match stage {
        Stage::Clean => actions.clean_release(),
        Stage::Scripts => actions.rebuild(TargetKind::Scripts, Mode::Build).await,
        Stage::Styles => actions.rebuild(TargetKind::Styles, Mode::Build).await,
        Stage::Assets => actions.rebuild(TargetKind::Assets, Mode::Build).await,
        Stage::Backend => actions.compile_backend().await,
    }
}

/// Initial watch-mode compile into the live directories.
///
/// Failures are logged and counted but never abort: the watchers will retry
/// on the next save.
pub async fn run_live_build(actions: &RebuildActions) -> usize {
    let mut failures = 0;
    for kind in TargetKind::ALL {
        if let Err(err) = actions.rebuild(kind, Mode::Watch).await {
            error!(kind = %kind, error = %err, "initial build failed; waiting for changes");
            failures += 1;
        }
    }
    failures
}
