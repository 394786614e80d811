use std::net::TcpStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use nfs_protocol::{client, ProtocolError, MAX_CHUNK_SIZE};
use sync_common::{Logger, Report, Status};

use crate::queue::{Queue, Task};
use crate::registry::Registry;

/// Fixed-size thread pool draining the task queue: each worker repeats
/// dequeue, activity check, PULL from source, PUSH to target, mark
/// complete. A task whose pair has since been cancelled is counted
/// complete without touching the network.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    #[must_use]
    pub fn spawn(count: usize, queue: Arc<Queue>, registry: Arc<Registry>, logger: Arc<Logger>) -> Self {
        let handles = (0..count)
            .map(|id| {
                let queue = Arc::clone(&queue);
                let registry = Arc::clone(&registry);
                let logger = Arc::clone(&logger);
                thread::spawn(move || worker_loop(id, &queue, &registry, &logger))
            })
            .collect();
        Self { handles }
    }

    /// Join every worker thread. Callers must have already drained the
    /// queue and called [`Queue::begin_shutdown`], or this blocks forever.
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

fn worker_loop(id: usize, queue: &Queue, registry: &Registry, logger: &Logger) {
    while let Some(task) = queue.dequeue() {
        if registry.is_active(&task.source_dir) {
            run_task(id, &task, registry, logger);
        }
        queue.progress().complete_one();
    }
}

fn run_task(id: usize, task: &Task, registry: &Registry, logger: &Logger) {
    let source_desc = format!("{}/{}@{}:{}", task.source_dir, task.filename, task.source_host, task.source_port);
    let target_desc = format!("{}/{}@{}:{}", task.target_dir, task.filename, task.target_host, task.target_port);
    let worker_id = id.to_string();

    let data = match pull_file(task) {
        Ok(data) => {
            log_outcome(logger, &source_desc, &target_desc, &worker_id, "PULL", Status::Success, format!("{} bytes pulled", data.len()));
            data
        }
        Err(e) => {
            log_outcome(logger, &source_desc, &target_desc, &worker_id, "PULL", Status::Error, e.to_string());
            registry.update_after_worker(&task.source_dir, false);
            return;
        }
    };

    match push_file(task, &data) {
        Ok(sent) => {
            log_outcome(logger, &source_desc, &target_desc, &worker_id, "PUSH", Status::Success, format!("{sent} bytes pushed"));
            registry.update_after_worker(&task.source_dir, true);
        }
        Err(e) => {
            log_outcome(logger, &source_desc, &target_desc, &worker_id, "PUSH", Status::Error, e.to_string());
            registry.update_after_worker(&task.source_dir, false);
        }
    }
}

fn pull_file(task: &Task) -> Result<Vec<u8>, ProtocolError> {
    let stream = TcpStream::connect((task.source_host.as_str(), task.source_port))?;
    let path = format!("{}/{}", task.source_dir, task.filename);
    client::pull(stream, &path)
}

fn push_file(task: &Task, data: &[u8]) -> Result<usize, ProtocolError> {
    let stream = TcpStream::connect((task.target_host.as_str(), task.target_port))?;
    let path = format!("{}/{}", task.target_dir, task.filename);
    client::push(stream, &path, data, MAX_CHUNK_SIZE)
}

fn log_outcome(logger: &Logger, source: &str, target: &str, worker_id: &str, op: &str, status: Status, details: String) {
    let report = Report::new(source, target, worker_id, op, status, details);
    let _ = logger.log_report(&report);
}
