#![allow(dead_code)]

use std::path::PathBuf;

use simjob::archive::ArchiveOptions;
use simjob::config::{ExecutableLocation, Settings};
use simjob::types::PathStyle;
use simjob::worker::Platform;

/// Builder for `Settings` to simplify test setup.
///
/// Defaults: native paths, direct invocation allowed, recursive archives.
pub struct SettingsBuilder {
    executable: PathBuf,
    path_style: PathStyle,
    platform: Platform,
    recursive: bool,
}

impl SettingsBuilder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            path_style: PathStyle::Native,
            platform: Platform::unrestricted(),
            recursive: true,
        }
    }

    pub fn path_style(mut self, style: PathStyle) -> Self {
        self.path_style = style;
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn recursive(mut self, val: bool) -> Self {
        self.recursive = val;
        self
    }

    pub fn build(self) -> Settings {
        Settings {
            location: ExecutableLocation::new(self.executable)
                .expect("Failed to build executable location from builder"),
            path_style: self.path_style,
            platform: self.platform,
            archive: ArchiveOptions {
                recursive: self.recursive,
            },
        }
    }
}
