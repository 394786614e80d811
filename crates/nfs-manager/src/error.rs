use std::io;

use thiserror::Error;

/// Startup errors: all of these are fatal and propagate out of `main` via
/// `anyhow`.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("failed to bind console port {port}: {source}")]
    Bind { port: u16, source: io::Error },
}
