//! Shared types for the domain log: the structured per-outcome log line,
//! the human-readable EXEC report block, and the append-only logger both
//! managers write through.
//!
//! This is deliberately separate from `tracing`: the line formats here are
//! part of the on-disk contract tests assert against byte-for-byte, so they
//! are rendered by hand rather than through a formatting layer whose output
//! isn't guaranteed stable across versions.

mod logger;
mod report;
mod timestamp;
mod worker_report;

pub use logger::{LogError, Logger};
pub use report::{Report, Status};
pub use timestamp::{format_system_time, now_string};
pub use worker_report::{parse_worker_report, render_worker_report, WorkerReport};
