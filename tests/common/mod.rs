#![allow(dead_code)]

pub use buildwatch_test_utils::builders;
pub use buildwatch_test_utils::fake_toolchain;
pub use buildwatch_test_utils::{init_tracing, with_timeout};

use std::path::Path;

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}
