// tests/config_validation.rs

mod common;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use buildwatch::config::{load_and_validate, load_or_default, ConfigFile, MAX_WATCH_TIMING};
use buildwatch::errors::BuildwatchError;
use buildwatch::types::{parse_duration, Mode, TargetKind};
use common::builders::ConfigFileBuilder;
use tempfile::NamedTempFile;

fn load_str(contents: &str) -> Result<ConfigFile, BuildwatchError> {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    load_and_validate(file.path())
}

fn expect_config_error(result: Result<ConfigFile, BuildwatchError>, needle: &str) {
    match result {
        Err(BuildwatchError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "{msg:?} does not mention {needle:?}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn empty_file_gives_builtin_layout() {
    let cfg = load_str("").unwrap();

    assert_eq!(cfg.scripts.src, PathBuf::from("internal/pages/ts"));
    assert_eq!(cfg.scripts.extension, "ts");
    assert_eq!(cfg.styles.entry, "main.css");
    assert_eq!(cfg.assets.ignore, vec!["js".to_string(), "css".to_string()]);
    assert_eq!(cfg.backend.entry, PathBuf::from("main.go"));
    assert_eq!(cfg.timings.debounce, Duration::from_secs(2));
    assert_eq!(cfg.timings.settle, Duration::from_millis(500));
    assert_eq!(cfg.timings.grace_period, Duration::from_secs(9));
    assert_eq!(cfg.tools.backend_run.program, "go");
}

#[test]
fn targets_switch_destination_by_mode() {
    let cfg = ConfigFileBuilder::new().build();

    let build = cfg.target(TargetKind::Scripts, Mode::Build);
    let watch = cfg.target(TargetKind::Scripts, Mode::Watch);
    assert_eq!(build.src, watch.src);
    assert_eq!(build.dest, PathBuf::from("build/public/js"));
    assert_eq!(watch.dest, PathBuf::from("public/js"));

    let kinds: Vec<TargetKind> = cfg.targets(Mode::Build).iter().map(|t| t.kind).collect();
    assert_eq!(kinds, TargetKind::ALL.to_vec());
}

#[test]
fn sections_override_defaults() {
    let cfg = load_str(
        r#"
[scripts]
src = "web/ts"
extension = "tsx"

[backend]
entry = "cmd/server/main.go"

[watch]
debounce = "750ms"
settle = "0ms"

[tools.backend_run]
program = "./bin/server"
args = []
"#,
    )
    .unwrap();

    assert_eq!(cfg.scripts.src, PathBuf::from("web/ts"));
    assert_eq!(cfg.scripts.extension, "tsx");
    // Untouched keys keep their defaults.
    assert_eq!(cfg.scripts.dest, PathBuf::from("build/public/js"));
    assert_eq!(cfg.backend.entry, PathBuf::from("cmd/server/main.go"));
    assert_eq!(cfg.timings.debounce, Duration::from_millis(750));
    assert_eq!(cfg.timings.settle, Duration::ZERO);
    assert_eq!(cfg.tools.backend_run.program, "./bin/server");
    assert!(cfg.tools.backend_run.args.is_empty());
}

#[test]
fn zero_debounce_is_rejected() {
    expect_config_error(load_str("[watch]\ndebounce = \"0s\"\n"), "debounce");
}

#[test]
fn malformed_duration_is_rejected() {
    expect_config_error(load_str("[watch]\ngrace_period = \"soon\"\n"), "grace_period");
}

#[test]
fn overflowing_duration_is_rejected() {
    expect_config_error(
        load_str("[watch]\ngrace_period = \"9999999999999999999h\"\n"),
        "too large",
    );
    expect_config_error(
        load_str("[watch]\nsettle = \"999999999999999999m\"\n"),
        "settle",
    );
}

#[test]
fn timings_above_one_day_are_rejected() {
    expect_config_error(
        load_str("[watch]\ndebounce = \"18446744073709551615s\"\n"),
        "at most 24h",
    );
    expect_config_error(load_str("[watch]\nsettle = \"25h\"\n"), "settle");

    let cfg = load_str("[watch]\ngrace_period = \"24h\"\n").unwrap();
    assert_eq!(cfg.timings.grace_period, MAX_WATCH_TIMING);
}

#[test]
fn dotted_extension_is_rejected() {
    expect_config_error(load_str("[backend]\nextension = \".go\"\n"), "dot");
}

#[test]
fn release_destination_outside_release_dir_is_rejected() {
    expect_config_error(
        load_str("[styles]\ndest = \"dist/css\"\n"),
        "outside the release directory",
    );
}

#[test]
fn dot_prefixed_release_paths_are_accepted() {
    let cfg = load_str(
        r#"
[backend]
release_dir = "./build"

[scripts]
dest = "build/public/js"
"#,
    )
    .unwrap();
    assert_eq!(cfg.backend.release_dir, PathBuf::from("./build"));
}

#[test]
fn asset_destination_inside_source_is_rejected() {
    expect_config_error(
        load_str("[assets]\nlive_dest = \"public/live\"\n"),
        "inside the asset source",
    );
}

#[test]
fn asset_destination_under_ignored_dir_is_accepted() {
    let cfg = load_str("[assets]\nlive_dest = \"public/js/static\"\n").unwrap();
    assert_eq!(cfg.assets.live_dest, PathBuf::from("public/js/static"));
}

#[test]
fn empty_tool_program_is_rejected() {
    expect_config_error(load_str("[tools.style]\nprogram = \"\"\n"), "tools.style");
}

#[test]
fn wrong_value_type_is_a_toml_error() {
    let result = load_str("[watch]\ndebounce = 5\n");
    assert!(matches!(result, Err(BuildwatchError::TomlError(_))));
}

#[test]
fn missing_explicit_config_file_is_an_io_error() {
    let result = load_or_default(Path::new("/definitely/not/here/Buildwatch.toml"));
    assert!(matches!(result, Err(BuildwatchError::IoError(_))));
}

#[test]
fn command_template_renders_placeholders_and_mode_flags() {
    let cfg = ConfigFileBuilder::new().build();
    let input = PathBuf::from("internal/pages/ts/a.ts");
    let outdir = PathBuf::from("public/js");

    let watch = cfg.tools.script.render(
        &[("input", input.as_path()), ("outdir", outdir.as_path())],
        Mode::Watch.minify(),
        Mode::Watch.inline_sourcemap(),
    );
    assert_eq!(
        cfg.tools.script.display(&watch),
        "bun build internal/pages/ts/a.ts --outdir public/js --target browser --format esm --sourcemap=inline"
    );

    let build = cfg.tools.script.render(
        &[("input", input.as_path()), ("outdir", outdir.as_path())],
        Mode::Build.minify(),
        Mode::Build.inline_sourcemap(),
    );
    assert_eq!(build.last().map(String::as_str), Some("--minify"));
}

#[test]
fn parse_duration_accepts_supported_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("2s"), Ok(Duration::from_secs(2)));
    assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
    assert_eq!(parse_duration(" 1h "), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("5d").is_err());
    assert!(parse_duration("18446744073709551615m").is_err());
    assert_eq!(
        parse_duration("18446744073709551615ms"),
        Ok(Duration::from_millis(u64::MAX))
    );
}
