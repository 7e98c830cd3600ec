//! Error taxonomy for CLI invocation and configuration handling.
//!
//! The executor never masks launch failures, non-zero exits, or timeouts;
//! callers decide whether a failure is build-fatal or advisory.

use std::io;
use std::time::Duration;

/// Errors produced by the buildlens core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Global configuration could not be loaded or parsed. Hard precondition
    /// for any resolution.
    #[error("configuration error: {0}")]
    Config(String),

    /// The CLI binary could not be spawned (not found, not executable).
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The CLI ran but exited non-zero. `stderr` carries the diagnostic.
    #[error("'{program}' exited with code {code}: {stderr}")]
    CliFailure {
        program: String,
        code: i32,
        stderr: String,
    },

    /// The CLI exceeded its deadline and was killed.
    #[error("'{program}' timed out after {}s", .limit.as_secs())]
    Timeout { program: String, limit: Duration },

    /// The CLI binary could not be downloaded from the configured URL.
    #[error("download failed: {0}")]
    Download(String),

    /// A caller-supplied extra parameter collides with a reserved flag.
    #[error("parameter '--{0}' collides with a reserved flag")]
    ReservedParam(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
