// src/config/validate.rs

use crate::archive::ArchiveOptions;
use crate::config::location::ExecutableLocation;
use crate::config::model::{RawSettings, Settings};
use crate::errors::WorkerError;
use crate::worker::Platform;

impl TryFrom<RawSettings> for Settings {
    type Error = WorkerError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let location = ExecutableLocation::new(raw.engine.executable)?;

        let platform = match raw.engine.supports_direct_invocation {
            Some(supported) => Platform {
                supports_direct_invocation: supported,
            },
            None => Platform::current(),
        };

        Ok(Settings {
            location,
            path_style: raw.engine.path_style,
            platform,
            archive: ArchiveOptions {
                recursive: raw.archive.recursive,
            },
        })
    }
}
