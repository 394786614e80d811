use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed request or response: {0}")]
    Malformed(String),

    /// The remote side reported an error on a PULL (negative size + reason).
    #[error("remote reported an error: {0}")]
    Remote(String),
}
