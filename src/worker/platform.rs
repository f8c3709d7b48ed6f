// src/worker/platform.rs

/// What the host platform allows the worker to do.
///
/// Resolved once (from the build target, optionally overridden by settings)
/// and checked at the top of every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Whether the engine can be started as a child process here. When
    /// false, the worker only writes the input file.
    pub supports_direct_invocation: bool,
}

impl Platform {
    /// Defaults for the platform this binary was built for. The engine
    /// cannot be launched programmatically on macOS.
    pub fn current() -> Self {
        Self {
            supports_direct_invocation: !cfg!(target_os = "macos"),
        }
    }

    pub fn restricted() -> Self {
        Self {
            supports_direct_invocation: false,
        }
    }

    pub fn unrestricted() -> Self {
        Self {
            supports_direct_invocation: true,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}
