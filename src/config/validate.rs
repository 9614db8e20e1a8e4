// src/config/validate.rs

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::config::model::{CommandTemplate, ConfigFile, RawConfigFile, WatchTimings};
use crate::errors::{BuildwatchError, Result};
use crate::types::parse_duration;

/// Upper bound for every `[watch]` timing.
pub const MAX_WATCH_TIMING: Duration = Duration::from_secs(24 * 60 * 60);

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BuildwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let timings = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, timings))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<WatchTimings> {
    let timings = validate_timings(cfg)?;
    validate_extensions(cfg)?;
    validate_release_layout(cfg)?;
    validate_asset_layout(cfg)?;
    validate_tools(cfg)?;
    Ok(timings)
}

fn validate_timings(cfg: &RawConfigFile) -> Result<WatchTimings> {
    let debounce = positive_duration("debounce", &cfg.watch.debounce)?;
    let grace_period = positive_duration("grace_period", &cfg.watch.grace_period)?;
    // A zero settle delay is allowed: some backends release their port
    // synchronously.
    let settle = bounded_duration("settle", &cfg.watch.settle)?;

    Ok(WatchTimings {
        debounce,
        settle,
        grace_period,
    })
}

fn positive_duration(field: &str, value: &str) -> Result<Duration> {
    let dur = bounded_duration(field, value)?;
    if dur.is_zero() {
        return Err(BuildwatchError::ConfigError(format!(
            "[watch].{field} must be greater than zero (got {value:?})"
        )));
    }
    Ok(dur)
}

fn bounded_duration(field: &str, value: &str) -> Result<Duration> {
    let dur = parse_duration(value)
        .map_err(|e| BuildwatchError::ConfigError(format!("[watch].{field} is invalid: {e}")))?;
    if dur > MAX_WATCH_TIMING {
        return Err(BuildwatchError::ConfigError(format!(
            "[watch].{field} must be at most 24h (got {value:?})"
        )));
    }
    Ok(dur)
}

fn validate_extensions(cfg: &RawConfigFile) -> Result<()> {
    for (section, ext) in [
        ("scripts", &cfg.scripts.extension),
        ("styles", &cfg.styles.extension),
        ("backend", &cfg.backend.extension),
    ] {
        if ext.trim().is_empty() {
            return Err(BuildwatchError::ConfigError(format!(
                "[{section}].extension must not be empty"
            )));
        }
        if ext.starts_with('.') {
            return Err(BuildwatchError::ConfigError(format!(
                "[{section}].extension must not start with a dot (got {ext:?})"
            )));
        }
    }
    Ok(())
}

/// The release directory is wiped before every build, so every release
/// destination has to live inside it.
fn validate_release_layout(cfg: &RawConfigFile) -> Result<()> {
    let release = normalize(&cfg.backend.release_dir);
    if release.as_os_str().is_empty() {
        return Err(BuildwatchError::ConfigError(
            "[backend].release_dir must not be the working directory".to_string(),
        ));
    }

    for (section, dest) in [
        ("scripts", &cfg.scripts.dest),
        ("styles", &cfg.styles.dest),
        ("assets", &cfg.assets.dest),
    ] {
        if !normalize(dest).starts_with(&release) {
            return Err(BuildwatchError::ConfigError(format!(
                "[{section}].dest {:?} is outside the release directory {:?}",
                dest, cfg.backend.release_dir
            )));
        }
    }
    Ok(())
}

/// Copying a tree into itself never terminates, unless the destination sits
/// under an ignored top-level entry.
fn validate_asset_layout(cfg: &RawConfigFile) -> Result<()> {
    let src = normalize(&cfg.assets.src);
    for dest in [&cfg.assets.dest, &cfg.assets.live_dest] {
        let dest_norm = normalize(dest);
        let Ok(rest) = dest_norm.strip_prefix(&src) else {
            continue;
        };
        let first = rest
            .components()
            .next()
            .map(|c| c.as_os_str().to_string_lossy().to_string());
        match first {
            Some(name) if cfg.assets.is_ignored(&name) => {}
            _ => {
                return Err(BuildwatchError::ConfigError(format!(
                    "asset destination {:?} is inside the asset source {:?}; \
                     add its top-level directory to [assets].ignore",
                    dest, cfg.assets.src
                )));
            }
        }
    }
    Ok(())
}

fn validate_tools(cfg: &RawConfigFile) -> Result<()> {
    let tools: [(&str, &CommandTemplate); 4] = [
        ("script", &cfg.tools.script),
        ("style", &cfg.tools.style),
        ("backend_build", &cfg.tools.backend_build),
        ("backend_run", &cfg.tools.backend_run),
    ];
    for (name, tool) in tools {
        if tool.program.trim().is_empty() {
            return Err(BuildwatchError::ConfigError(format!(
                "[tools.{name}].program must not be empty"
            )));
        }
    }
    Ok(())
}

/// Lexical normalization: drops `.` components so `./build` and `build`
/// compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
