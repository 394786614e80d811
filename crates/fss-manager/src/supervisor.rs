use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::mpsc::{Receiver, Sender};

use notify::RecommendedWatcher;
use sync_common::{now_string, Logger, Report, Status, WorkerReport};

use crate::backlog::{Backlog, QueuedOp};
use crate::child;
use crate::dispatcher;
use crate::registry::{Pair, Registry};
use crate::watch;

/// Everything the supervisor's single consumer thread can be told about.
/// Every producer (admin-pipe reader, each child's reader/waiter thread,
/// the filesystem watcher) only ever constructs and sends one of these;
/// none of them touch `Supervisor` state directly.
pub enum SupervisorMsg {
    Command(String),
    FsEvent {
        dir: String,
        filename: String,
        operation: &'static str,
    },
    ChildReport(WorkerReport),
    ChildExited {
        pid: u32,
        status: std::io::Result<ExitStatus>,
    },
}

struct ChildContext {
    source: String,
    operation: String,
}

/// The single owner of the Sync Registry, the backlog, and the child
/// table (C5). Constructed once in `main`, consumed by [`Supervisor::run`].
pub struct Supervisor {
    pub(crate) registry: Registry,
    pub(crate) backlog: Backlog,
    active_children: HashMap<u32, ChildContext>,
    pub(crate) worker_limit: usize,
    pub(crate) logger: Logger,
    fss_out: File,
    pub(crate) watcher: RecommendedWatcher,
    worker_bin: PathBuf,
    tx: Sender<SupervisorMsg>,
    pub(crate) shutting_down: bool,
}

impl Supervisor {
    pub fn new(
        worker_limit: usize,
        logger: Logger,
        fss_out: File,
        watcher: RecommendedWatcher,
        worker_bin: PathBuf,
        tx: Sender<SupervisorMsg>,
    ) -> Self {
        Self {
            registry: Registry::new(),
            backlog: Backlog::new(),
            active_children: HashMap::new(),
            worker_limit,
            logger,
            fss_out,
            watcher,
            worker_bin,
            tx,
            shutting_down: false,
        }
    }

    /// Register every configured pair, start watching it, log the
    /// outcome, and schedule its initial FULL sync — mirrors the
    /// original's startup loop over the parsed config file.
    pub fn bootstrap(&mut self, pairs: Vec<(String, String)>) {
        for (source, target) in pairs {
            self.register_pair(&source, &target);
        }
    }

    pub(crate) fn register_pair(&mut self, source: &str, target: &str) {
        let mut pair = Pair::new(source, target);
        match watch::watch_dir(&mut self.watcher, source) {
            Ok(()) => {
                pair.watching = true;
                self.registry.insert(pair);
                self.log_message(&format!("Added directory: {source} -> {target}"));
                self.log_message(&format!("Monitoring started for {source}"));
            }
            Err(_) => {
                self.registry.insert(pair);
                self.log_message(&format!("Failed to monitor {source}"));
            }
        }
        self.schedule(source, target, "ALL", "FULL");
    }

    pub(crate) fn log_message(&self, message: &str) {
        let _ = self.logger.log_message(message);
    }

    pub(crate) fn respond(&mut self, text: &str) {
        let _ = self.fss_out.write_all(text.as_bytes());
        let _ = self.fss_out.flush();
    }

    pub(crate) fn schedule(&mut self, source: &str, target: &str, filename: &str, operation: &str) {
        if self.active_children.len() >= self.worker_limit {
            self.backlog.push(QueuedOp {
                source: source.to_string(),
                target: target.to_string(),
                filename: filename.to_string(),
                operation: operation.to_string(),
            });
            tracing::info!(source, operation, "worker limit reached, queued operation");
            return;
        }

        match child::spawn_worker(&self.worker_bin, source, target, filename, operation, self.tx.clone()) {
            Ok(pid) => {
                self.active_children.insert(
                    pid,
                    ChildContext {
                        source: source.to_string(),
                        operation: operation.to_string(),
                    },
                );
                if let Some(p) = self.registry.find_mut(source) {
                    p.last_worker_id = Some(pid);
                    p.last_operation = Some(operation.to_string());
                }
            }
            Err(e) => {
                tracing::warn!(source, operation, error = %e, "failed to spawn worker");
            }
        }
    }

    fn drain_backlog(&mut self) {
        while self.active_children.len() < self.worker_limit {
            let Some(op) = self.backlog.pop() else { break };
            self.schedule(&op.source, &op.target, &op.filename, &op.operation);
        }
    }

    #[must_use]
    pub(crate) fn active_worker_count(&self) -> usize {
        self.active_children.len()
    }

    /// Drive the event loop until shutdown completes. Consumes `self`
    /// because there is nothing left to do with a supervisor afterward.
    pub fn run(mut self, rx: Receiver<SupervisorMsg>) {
        for msg in rx {
            match msg {
                SupervisorMsg::Command(line) => dispatcher::dispatch(&mut self, &line),
                SupervisorMsg::FsEvent {
                    dir,
                    filename,
                    operation,
                } => self.handle_fs_event(&dir, &filename, operation),
                SupervisorMsg::ChildReport(report) => self.handle_child_report(&report),
                SupervisorMsg::ChildExited { pid, status } => self.handle_child_exited(pid, &status),
            }

            if self.shutting_down && self.active_children.is_empty() && self.backlog.is_empty() {
                self.finish_shutdown();
                return;
            }
        }
    }

    fn handle_fs_event(&mut self, dir: &str, filename: &str, operation: &'static str) {
        let Some(pair) = self.registry.find(dir) else {
            return;
        };
        if !pair.active {
            return;
        }
        let target = pair.target_path.clone();
        self.schedule(dir, &target, filename, operation);
    }

    fn handle_child_report(&mut self, report: &WorkerReport) {
        let status: Status = report.status.parse().unwrap_or(Status::Error);
        let mut domain_report = Report::new(
            report.source.clone(),
            report.target.clone(),
            report.pid.to_string(),
            report.operation.clone(),
            status,
            report.details.clone(),
        );
        if status == Status::Error {
            domain_report = domain_report.with_errors(report.details.clone());
        }
        let _ = self.logger.log_report(&domain_report);
        print!("{}", domain_report.render_exec_report());
        let _ = std::io::stdout().flush();
    }

    fn handle_child_exited(&mut self, pid: u32, status: &std::io::Result<ExitStatus>) {
        if let Some(ctx) = self.active_children.remove(&pid) {
            let success = child::exited_successfully(status);
            self.registry.update_after_worker(&ctx.source, success, pid, &ctx.operation);
        }
        self.drain_backlog();
    }

    fn finish_shutdown(&mut self) {
        self.respond(&format!("[{}] Manager shutdown complete\n", now_string()));
        self.log_message("Manager shutdown complete");
    }
}
