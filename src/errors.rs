// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildwatchError {
    /// A process (backend or external compiler) could not be spawned.
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external compiler ran but reported failure.
    #[error("{stage} failed for {input:?}: {detail}")]
    Compile {
        stage: String,
        input: PathBuf,
        detail: String,
    },

    /// Copying static assets failed.
    #[error("copy failed for {path:?}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The grace period elapsed before the process exited. Only used
    /// internally to trigger escalation to a forceful kill.
    #[error("process {pid:?} did not exit within {grace:?}")]
    ProcessStopTimeout { pid: Option<u32>, grace: Duration },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildwatchError {
    pub fn compile(stage: &str, input: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        BuildwatchError::Compile {
            stage: stage.to_string(),
            input: input.into(),
            detail: detail.into(),
        }
    }

    pub fn copy(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        BuildwatchError::Copy {
            path: path.into(),
            source,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildwatchError>;
