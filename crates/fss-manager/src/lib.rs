//! Single-threaded event-driven supervisor for local filesystem mirroring.
//! The binary entry point lives in
//! `main.rs`; this library exists so integration tests can drive a
//! [`Supervisor`] directly instead of shelling out to the compiled binary.

pub mod backlog;
pub mod child;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod supervisor;
pub mod watch;

pub use supervisor::{Supervisor, SupervisorMsg};
