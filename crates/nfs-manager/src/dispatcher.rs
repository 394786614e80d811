use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;

use nfs_protocol::client;
use sync_common::{now_string, Logger};

use crate::config::{self, Endpoint};
use crate::queue::{Queue, Task};
use crate::registry::{Pair, Registry};

/// Shared handles the console dispatcher and the startup bootstrap both
/// need.
pub struct ManagerState {
    pub registry: Arc<Registry>,
    pub queue: Arc<Queue>,
    pub logger: Arc<Logger>,
}

/// Enumerate every file under `pair.source_dir` via `LIST` and enqueue one
/// task per entry. Used for the startup full sync and for `add`.
pub fn enumerate_and_enqueue(pair: &Pair, queue: &Queue) -> Result<usize, nfs_protocol::ProtocolError> {
    let stream = TcpStream::connect((pair.source_host.as_str(), pair.source_port))?;
    let entries = client::list_dir(stream, &pair.source_dir)?;
    let count = entries.len();
    for filename in entries {
        queue.enqueue(Task {
            source_dir: pair.source_dir.clone(),
            source_host: pair.source_host.clone(),
            source_port: pair.source_port,
            target_dir: pair.target_dir.clone(),
            target_host: pair.target_host.clone(),
            target_port: pair.target_port,
            filename,
        });
    }
    Ok(count)
}

/// Drive one console session to completion. Returns `true` once `shutdown`
/// has been handled, so the accept loop can stop taking new sessions.
pub fn handle_session(stream: TcpStream, state: &ManagerState) -> bool {
    let Ok(mut writer) = stream.try_clone() else {
        return false;
    };
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let shutdown_requested = dispatch(trimmed, state, &mut writer);
        let _ = writer.write_all(b"END\n");
        let _ = writer.flush();
        if shutdown_requested {
            return true;
        }
    }
}

fn dispatch(line: &str, state: &ManagerState, writer: &mut impl Write) -> bool {
    let mut tokens = line.split_whitespace();
    let Some(cmd) = tokens.next() else {
        let _ = writeln!(writer, "Invalid command format");
        return false;
    };

    match cmd {
        "add" => {
            let (Some(source), Some(target)) = (tokens.next(), tokens.next()) else {
                let _ = writeln!(writer, "Invalid add command");
                return false;
            };
            add(source, target, state, writer);
            false
        }
        "cancel" => {
            let Some(source) = tokens.next() else {
                let _ = writeln!(writer, "Invalid cancel command");
                return false;
            };
            cancel(source, state, writer);
            false
        }
        "shutdown" => {
            shutdown(state, writer);
            true
        }
        other => {
            let _ = writeln!(writer, "Unknown command: {other}");
            false
        }
    }
}

fn add(source_token: &str, target_token: &str, state: &ManagerState, writer: &mut impl Write) {
    let ts = now_string();
    if state.queue.is_shutting_down() {
        let _ = writeln!(writer, "[{ts}] Shutdown in progress, cannot add: {source_token}");
        return;
    }

    let source = match config::parse_endpoint(source_token) {
        Ok(e) => e,
        Err(reason) => {
            let _ = writeln!(writer, "[{ts}] Invalid source format: {reason}");
            return;
        }
    };
    let target: Endpoint = match config::parse_endpoint(target_token) {
        Ok(e) => e,
        Err(reason) => {
            let _ = writeln!(writer, "[{ts}] Invalid target format: {reason}");
            return;
        }
    };

    if state.registry.contains(&source.dir) {
        let _ = writeln!(writer, "[{ts}] Already in queue: {}", source.dir);
        return;
    }

    if let Err(e) = std::fs::create_dir_all(&target.dir) {
        let _ = writeln!(writer, "[{ts}] Failed to create target directory: {e}");
        return;
    }

    let source_dir = source.dir.clone();
    let target_dir = target.dir.clone();
    let pair = Pair::new(source, target);
    state.registry.insert(pair.clone());
    let _ = state.logger.log_message(&format!("Added directory: {source_dir} -> {target_dir}"));

    match enumerate_and_enqueue(&pair, &state.queue) {
        Ok(count) => {
            let _ = writeln!(writer, "[{ts}] Added directory: {source_dir} -> {target_dir}");
            let _ = writeln!(writer, "[{ts}] Monitoring started for {source_dir}");
            let _ = writeln!(writer, "[{ts}] {count} file(s) queued for {source_dir}");
        }
        Err(e) => {
            let _ = writeln!(writer, "[{ts}] Failed to enumerate {source_dir}: {e}");
        }
    }
}

fn cancel(source_dir: &str, state: &ManagerState, writer: &mut impl Write) {
    let ts = now_string();
    if state.registry.mark_inactive(source_dir) {
        let _ = state.logger.log_message(&format!("Synchronization stopped for {source_dir}"));
        let _ = writeln!(writer, "[{ts}] Synchronization stopped for {source_dir}");
    } else {
        let _ = writeln!(writer, "[{ts}] Directory not being synchronized: {source_dir}");
    }
}

fn shutdown(state: &ManagerState, writer: &mut impl Write) {
    let ts = now_string();
    let _ = state.logger.log_message("Shutting down manager");
    let _ = writeln!(writer, "[{ts}] Shutting down manager...");
    let _ = writeln!(writer, "[{ts}] Waiting for all active workers to finish.");
    let _ = writeln!(writer, "[{ts}] Processing remaining queued tasks.");

    state.queue.progress().wait_all_done();
    state.queue.begin_shutdown();

    let ts = now_string();
    let _ = state.logger.log_message("Manager shutdown complete");
    let _ = writeln!(writer, "[{ts}] Manager shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Queue;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn state() -> (ManagerState, TempDir) {
        let dir = TempDir::new().unwrap();
        let logger = Arc::new(Logger::open(&dir.path().join("manager.log")).unwrap());
        let state = ManagerState {
            registry: Arc::new(Registry::new()),
            queue: Arc::new(Queue::new(8)),
            logger,
        };
        (state, dir)
    }

    #[test]
    fn cancel_on_unknown_directory_reports_not_synchronized() {
        let (state, _dir) = state();
        let mut out = Vec::new();
        cancel("/nowhere", &state, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Directory not being synchronized: /nowhere"));
    }

    #[test]
    fn add_then_add_again_reports_already_in_queue() {
        let (state, dir) = state();
        let target = dir.path().join("target");
        let mut out = Vec::new();
        state.registry.insert(Pair::new(
            Endpoint { dir: "/src".into(), host: "h1".into(), port: 1 },
            Endpoint { dir: target.to_string_lossy().into_owned(), host: "h2".into(), port: 2 },
        ));
        add("/src@h1:1", &format!("{}@h2:2", target.display()), &state, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Already in queue: /src"));
    }

    #[test]
    fn shutdown_waits_for_in_flight_tasks_before_reporting_complete() {
        let (state, _dir) = state();
        let mut out = Vec::new();
        shutdown(&state, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Manager shutdown complete"));
        assert!(state.queue.is_shutting_down());
    }
}
