//! Error taxonomy for the pipeline.
//!
//! Every failure path is an explicit value; nothing is thrown past the
//! binary's entry point. The CLI maps all of these to exit code 1 with an
//! `Error:` line on stderr.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Backend unreachable and no starter command configured.
    #[error("LLM not reachable and no starter configured")]
    BackendUnavailable,

    /// The starter was launched but the backend never answered the probe.
    #[error("LLM did not start within {0:.0?}")]
    StartupTimeout(Duration),

    /// The starter command itself could not be spawned.
    #[error("failed to launch starter `{command}`: {source}")]
    StarterLaunch {
        command: String,
        source: std::io::Error,
    },

    /// Every query attempt failed, or a reply carried no content.
    #[error("no response from LLM")]
    NoResponse,

    /// `--edit` and `--append` supplied together.
    #[error("--edit and --append are mutually exclusive")]
    ConflictingFileFlags,

    /// A mode string that is not one of the supported modes.
    #[error("unknown mode `{0}` (expected bash, sh, zsh, fish, python or none)")]
    UnknownMode(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
