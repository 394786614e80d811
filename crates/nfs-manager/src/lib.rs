//! Producer/consumer engine mirroring directories across hosts over the
//! data-node wire protocol: a registry of configured pairs, a bounded task
//! queue served by a fixed pool of worker threads, and the TCP console
//! protocol that drives both. The binary entry point lives in `main.rs`;
//! this crate is split out as a library purely so integration tests can
//! drive a real [`Registry`]/[`Queue`]/[`WorkerPool`] without going through
//! a subprocess.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod pool;
pub mod queue;
pub mod registry;

pub use dispatcher::ManagerState;
pub use pool::WorkerPool;
pub use queue::{Progress, Queue, Task};
pub use registry::{Pair, Registry};
