use std::fmt;
use std::time::Duration;

/// Which top-level mode the orchestrator runs in.
///
/// - `Build`: compile everything into the release directory once and exit.
/// - `Watch`: compile into live directories, supervise the backend and keep
///   rebuilding on change until interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Build,
    Watch,
}

impl Mode {
    pub fn from_watch_flag(watch: bool) -> Self {
        if watch { Mode::Watch } else { Mode::Build }
    }

    /// Release builds are minified.
    pub fn minify(self) -> bool {
        matches!(self, Mode::Build)
    }

    /// Watch builds carry inline source maps.
    pub fn inline_sourcemap(self) -> bool {
        matches!(self, Mode::Watch)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Build => f.write_str("build"),
            Mode::Watch => f.write_str("watch"),
        }
    }
}

/// The transform applied to a frontend build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Compile every script file through the script compiler.
    Scripts,
    /// Compile the entry stylesheet through the style compiler.
    Styles,
    /// Copy static files verbatim.
    Assets,
}

impl TargetKind {
    pub const ALL: [TargetKind; 3] = [TargetKind::Scripts, TargetKind::Styles, TargetKind::Assets];
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Scripts => f.write_str("scripts"),
            TargetKind::Styles => f.write_str("styles"),
            TargetKind::Assets => f.write_str("assets"),
        }
    }
}

/// Parse a `[watch]` duration such as `"250ms"`, `"2s"`, `"1m"` or `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration {s:?} has no unit (ms, s, m or h)"))?;
    let (digits, unit) = s.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration number {digits:?}: {e}"))?;

    let secs_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        other => {
            return Err(format!(
                "unsupported duration unit {other:?}; expected ms, s, m or h"
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration {s:?} is too large"))
}
