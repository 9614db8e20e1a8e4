// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{Mode, TargetKind};

/// Configuration as read from a TOML file, before validation.
///
/// Every section is optional; missing sections fall back to the layout of a
/// Go backend with a Bun/Tailwind frontend:
///
/// ```toml
/// [scripts]
/// src = "internal/pages/ts"
/// dest = "build/public/js"
/// live_dest = "public/js"
///
/// [backend]
/// entry = "main.go"
/// release_dir = "build"
///
/// [watch]
/// debounce = "2s"
/// grace_period = "9s"
///
/// [tools.backend_run]
/// program = "go"
/// args = ["run", "{entry}"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub assets: AssetsSection,

    #[serde(default)]
    pub backend: BackendSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub tools: ToolsSection,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>`, so durations are
/// already parsed and paths have been sanity checked.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scripts: ScriptsSection,
    pub styles: StylesSection,
    pub assets: AssetsSection,
    pub backend: BackendSection,
    pub timings: WatchTimings,
    pub tools: ToolsSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile, timings: WatchTimings) -> Self {
        Self {
            scripts: raw.scripts,
            styles: raw.styles,
            assets: raw.assets,
            backend: raw.backend,
            timings,
            tools: raw.tools,
        }
    }

    /// Resolve the build target for `kind` in the given mode.
    ///
    /// Build mode writes into the release tree; watch mode writes into the
    /// live directories.
    pub fn target(&self, kind: TargetKind, mode: Mode) -> BuildTarget {
        let (src, dest, live_dest) = match kind {
            TargetKind::Scripts => (&self.scripts.src, &self.scripts.dest, &self.scripts.live_dest),
            TargetKind::Styles => (&self.styles.src, &self.styles.dest, &self.styles.live_dest),
            TargetKind::Assets => (&self.assets.src, &self.assets.dest, &self.assets.live_dest),
        };
        let dest = match mode {
            Mode::Build => dest,
            Mode::Watch => live_dest,
        };
        BuildTarget {
            kind,
            src: src.clone(),
            dest: dest.clone(),
        }
    }

    /// All frontend targets in pipeline order.
    pub fn targets(&self, mode: Mode) -> Vec<BuildTarget> {
        TargetKind::ALL
            .iter()
            .map(|kind| self.target(*kind, mode))
            .collect()
    }
}

/// A (source tree, destination tree, transform) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub kind: TargetKind,
    pub src: PathBuf,
    pub dest: PathBuf,
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScriptsSection {
    /// Root of the script sources.
    pub src: PathBuf,
    /// Release output directory.
    pub dest: PathBuf,
    /// Watch-mode output directory.
    pub live_dest: PathBuf,
    /// Source extension, without the dot.
    pub extension: String,
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            src: PathBuf::from("internal/pages/ts"),
            dest: PathBuf::from("build/public/js"),
            live_dest: PathBuf::from("public/js"),
            extension: "ts".to_string(),
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StylesSection {
    pub src: PathBuf,
    pub dest: PathBuf,
    pub live_dest: PathBuf,
    /// Entry stylesheet, relative to `src`.
    pub entry: String,
    /// Output file name, relative to the destination.
    pub output: String,
    /// Extension that triggers a rebuild in watch mode.
    pub extension: String,
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            src: PathBuf::from("internal/pages/css"),
            dest: PathBuf::from("build/public/css"),
            live_dest: PathBuf::from("public/css"),
            entry: "main.css".to_string(),
            output: "main.css".to_string(),
            extension: "css".to_string(),
        }
    }
}

/// `[assets]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsSection {
    pub src: PathBuf,
    pub dest: PathBuf,
    pub live_dest: PathBuf,
    /// Top-level entries of `src` that are never copied (they have their own
    /// pipelines).
    pub ignore: Vec<String>,
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            src: PathBuf::from("public"),
            dest: PathBuf::from("build/public"),
            live_dest: PathBuf::from("tmp/public"),
            ignore: vec!["js".to_string(), "css".to_string()],
        }
    }
}

impl AssetsSection {
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|i| i == name)
    }
}

/// `[backend]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Root of the backend sources; every file with `extension` below it is
    /// watched in watch mode.
    pub src: PathBuf,
    /// Entry point handed to the backend compiler and runtime.
    pub entry: PathBuf,
    pub extension: String,
    /// Release directory. Removed at the start of every build.
    pub release_dir: PathBuf,
    /// Working directory for the backend runtime.
    pub workdir: PathBuf,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            src: PathBuf::from("internal"),
            entry: PathBuf::from("main.go"),
            extension: "go".to_string(),
            release_dir: PathBuf::from("build"),
            workdir: PathBuf::from("."),
        }
    }
}

/// `[watch]` section. Durations use the `"500ms"` / `"2s"` / `"1m"` syntax.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Quiet period after the last backend change before restarting.
    pub debounce: String,
    /// Pause between stopping the old backend and starting the new one so the
    /// OS can release its listening socket.
    pub settle: String,
    /// How long a graceful stop may take before the backend is killed.
    pub grace_period: String,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce: "2s".to_string(),
            settle: "500ms".to_string(),
            grace_period: "9s".to_string(),
        }
    }
}

/// Parsed `[watch]` durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTimings {
    pub debounce: std::time::Duration,
    pub settle: std::time::Duration,
    pub grace_period: std::time::Duration,
}

impl Default for WatchTimings {
    fn default() -> Self {
        use std::time::Duration;
        Self {
            debounce: Duration::from_secs(2),
            settle: Duration::from_millis(500),
            grace_period: Duration::from_secs(9),
        }
    }
}

/// `[tools.*]` sections: how each external collaborator is invoked.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub script: CommandTemplate,
    pub style: CommandTemplate,
    pub backend_build: CommandTemplate,
    pub backend_run: CommandTemplate,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            script: CommandTemplate {
                program: "bun".to_string(),
                args: strings(&[
                    "build",
                    "{input}",
                    "--outdir",
                    "{outdir}",
                    "--target",
                    "browser",
                    "--format",
                    "esm",
                ]),
                minify_args: strings(&["--minify"]),
                sourcemap_args: strings(&["--sourcemap=inline"]),
            },
            style: CommandTemplate {
                program: "bunx".to_string(),
                args: strings(&["--bun", "tailwindcss", "-i", "{input}", "-o", "{output}"]),
                minify_args: strings(&["--minify"]),
                sourcemap_args: Vec::new(),
            },
            backend_build: CommandTemplate {
                program: "go".to_string(),
                args: strings(&["build", "-o", "{output}", "{entry}"]),
                minify_args: Vec::new(),
                sourcemap_args: Vec::new(),
            },
            backend_run: CommandTemplate {
                program: "go".to_string(),
                args: strings(&["run", "{entry}"]),
                minify_args: Vec::new(),
                sourcemap_args: Vec::new(),
            },
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A program plus argument template.
///
/// Arguments may contain `{input}`, `{outdir}`, `{output}` and `{entry}`
/// placeholders. `minify_args` and `sourcemap_args` are appended when the
/// mode asks for them.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
    pub minify_args: Vec<String>,
    pub sourcemap_args: Vec<String>,
}

impl CommandTemplate {
    /// Expand placeholders and append the optional flag groups.
    pub fn render(&self, vars: &[(&str, &Path)], minify: bool, sourcemap: bool) -> Vec<String> {
        let mut out: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (key, value)| {
                    acc.replace(&format!("{{{key}}}"), &value.to_string_lossy())
                })
            })
            .collect();
        if minify {
            out.extend(self.minify_args.iter().cloned());
        }
        if sourcemap {
            out.extend(self.sourcemap_args.iter().cloned());
        }
        out
    }

    /// Human-readable command line, used for logging and `--dry-run`.
    pub fn display(&self, args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(args.iter().map(|s| s.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
