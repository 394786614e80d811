use std::io;

use thiserror::Error;

/// Startup errors: all of these are fatal and
/// propagate out of `main` via `anyhow`.
#[derive(Debug, Error)]
pub enum FssError {
    #[error("failed to create named pipe {path}: {source}")]
    CreatePipe { path: String, source: nix::Error },

    #[error("failed to open pipe {path}: {source}")]
    OpenPipe { path: String, source: io::Error },

    #[error("failed to start filesystem watcher: {0}")]
    Watcher(#[from] notify::Error),

    #[error(transparent)]
    Log(#[from] sync_common::LogError),
}
