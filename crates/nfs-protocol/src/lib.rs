//! The data-node wire protocol: line-framed `LIST`/`PULL`
//! requests and a chunked, counted-byte-framed `PUSH` that carries binary
//! payloads safely regardless of embedded newlines or null bytes.
//!
//! [`server`] is the data-node side (reads requests off a connection,
//! writes responses); [`client`] is the manager-worker side (writes
//! requests, reads the PULL/LIST responses). Both share [`framing`]'s
//! token reader so the two ends agree on exactly where a token ends and the
//! next one begins.

mod error;
mod framing;

pub mod client;
pub mod server;

pub use error::ProtocolError;

/// Maximum bytes sent in a single `PUSH` chunk.
pub const MAX_CHUNK_SIZE: usize = 1024;
