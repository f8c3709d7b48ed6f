// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::archive::ArchiveOptions;
use crate::config::location::ExecutableLocation;
use crate::types::PathStyle;
use crate::worker::Platform;

/// Settings file as read from TOML, before validation.
///
/// ```toml
/// [engine]
/// executable = "/opt/winxray/WinXRay.exe"
/// path_style = "windows"
/// supports_direct_invocation = true
///
/// [archive]
/// recursive = true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawSettings {
    pub engine: EngineSection,

    #[serde(default)]
    pub archive: ArchiveSection,
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Path to the engine binary. Must be absolute.
    pub executable: PathBuf,

    /// How the input path is spelled on the command line.
    #[serde(default)]
    pub path_style: PathStyle,

    /// Override of the platform default. If `None`, [`Platform::current`]
    /// decides.
    #[serde(default)]
    pub supports_direct_invocation: Option<bool>,
}

/// `[archive]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveSection {
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

fn default_recursive() -> bool {
    true
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            recursive: default_recursive(),
        }
    }
}

impl RawSettings {
    /// Minimal settings for an engine at `executable`, everything else default.
    pub fn for_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            engine: EngineSection {
                executable: executable.into(),
                path_style: PathStyle::default(),
                supports_direct_invocation: None,
            },
            archive: ArchiveSection::default(),
        }
    }
}

/// Validated worker settings.
///
/// Construct via `Settings::try_from(raw)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub location: ExecutableLocation,
    pub path_style: PathStyle,
    pub platform: Platform,
    pub archive: ArchiveOptions,
}
