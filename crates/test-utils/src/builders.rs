#![allow(dead_code)]

use std::path::Path;

use buildwatch::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    /// Built-in layout, relative to the working directory.
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Built-in layout with every path moved below `root`.
    pub fn rooted_at(root: &Path) -> Self {
        let mut config = RawConfigFile::default();

        for path in [
            &mut config.scripts.src,
            &mut config.scripts.dest,
            &mut config.scripts.live_dest,
            &mut config.styles.src,
            &mut config.styles.dest,
            &mut config.styles.live_dest,
            &mut config.assets.src,
            &mut config.assets.dest,
            &mut config.assets.live_dest,
            &mut config.backend.src,
            &mut config.backend.entry,
            &mut config.backend.release_dir,
        ] {
            *path = root.join(&*path);
        }
        config.backend.workdir = root.to_path_buf();

        Self { config }
    }

    pub fn debounce(mut self, value: &str) -> Self {
        self.config.watch.debounce = value.to_string();
        self
    }

    pub fn settle(mut self, value: &str) -> Self {
        self.config.watch.settle = value.to_string();
        self
    }

    pub fn grace_period(mut self, value: &str) -> Self {
        self.config.watch.grace_period = value.to_string();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
