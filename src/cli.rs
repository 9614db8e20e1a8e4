// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `buildwatch`.
///
/// Arguments clap does not recognise are ignored rather than rejected, so a
/// stray flag still gets a release build.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildwatch",
    version,
    about = "Build a web project for release, or watch it and supervise the backend.",
    long_about = None,
    ignore_errors = true
)]
pub struct CliArgs {
    /// Watch sources, rebuild on change and keep the backend running.
    ///
    /// Without this flag a one-shot release build is performed.
    #[arg(long)]
    pub watch: bool,

    /// Path to the config file (TOML).
    ///
    /// Default: `Buildwatch.toml` in the current working directory. If that
    /// file does not exist the built-in project layout is used.
    #[arg(long, value_name = "PATH", default_value = "Buildwatch.toml")]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the resolved targets and commands, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
