use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::Sender;
use std::thread;

use sync_common::parse_worker_report;

use crate::supervisor::SupervisorMsg;

/// Spawn a worker child process, returning its pid. A dedicated reader
/// thread drains the child's stdout line-by-line, forwarding parsed
/// `[WORKER_REPORT]` lines to the supervisor, then waits for the child to
/// exit and forwards a `ChildExited` message. This is the channel-based
/// reaping scheme replaces a SIGCHLD handler: nothing here runs in
/// async-signal-unsafe context, and the supervisor's state is mutated only
/// by the single consumer of `tx`.
pub fn spawn_worker(
    worker_bin: &Path,
    source: &str,
    target: &str,
    filename: &str,
    operation: &str,
    tx: Sender<SupervisorMsg>,
) -> std::io::Result<u32> {
    let mut child = Command::new(worker_bin)
        .args([source, target, filename, operation])
        .stdout(Stdio::piped())
        .spawn()?;

    let pid = child.id();
    let stdout = child.stdout.take().expect("child spawned with piped stdout");

    thread::spawn(move || {
        let reader = BufReader::new(stdout);
        for line in reader.lines().map_while(Result::ok) {
            if let Some(report) = parse_worker_report(&line) {
                if tx.send(SupervisorMsg::ChildReport(report)).is_err() {
                    return;
                }
            }
        }
        let status = child.wait();
        let _ = tx.send(SupervisorMsg::ChildExited { pid, status });
    });

    Ok(pid)
}

/// Whether a reaped child's exit should count as a sync failure, matching
/// the original's `!WIFEXITED(status) || WEXITSTATUS(status)` check.
#[must_use]
pub fn exited_successfully(status: &std::io::Result<ExitStatus>) -> bool {
    matches!(status, Ok(s) if s.success())
}
