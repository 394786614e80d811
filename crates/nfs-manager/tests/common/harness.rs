use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nfs_manager::config::Endpoint;
use nfs_manager::registry::Pair;
use nfs_manager::{dispatcher, ManagerState, Queue, Registry, WorkerPool};
use tempfile::TempDir;

/// A spawned `nfs-datanode` subprocess bound to an OS-assigned loopback
/// port, serving its own temp directory. Killed on drop.
pub struct DataNode {
    pub dir: TempDir,
    pub port: u16,
    child: Child,
}

impl DataNode {
    pub fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let port = free_port();
        let child = Command::new(env!("CARGO_BIN_EXE_nfs-datanode"))
            .args(["--port", &port.to_string(), "--bind", "127.0.0.1"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to spawn nfs-datanode");

        wait_for_port(port, Duration::from_secs(2));
        Self { dir, port, child }
    }
}

impl Drop for DataNode {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

fn wait_for_port(port: u16, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if std::net::TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!("nfs-datanode on port {port} never came up");
}

/// Drives a real `Registry` + `Queue` + `WorkerPool` against two live
/// `DataNode` subprocesses, without going through the `nfs-manager` binary
/// or its console protocol.
pub struct Harness {
    pub source: DataNode,
    pub target: DataNode,
    state: Arc<ManagerState>,
    pool: Option<WorkerPool>,
    _log_dir: TempDir,
}

impl Harness {
    pub fn start(workers: usize, queue_capacity: usize) -> Self {
        let source = DataNode::start();
        let target = DataNode::start();

        let log_dir = TempDir::new().unwrap();
        let logger = Arc::new(sync_common::Logger::open(&log_dir.path().join("manager.log")).unwrap());
        let registry = Arc::new(Registry::new());
        let queue = Arc::new(Queue::new(queue_capacity));
        let pool = WorkerPool::spawn(workers, Arc::clone(&queue), Arc::clone(&registry), Arc::clone(&logger));

        let state = Arc::new(ManagerState { registry, queue, logger });
        Self { source, target, state, pool: Some(pool), _log_dir: log_dir }
    }

    fn source_endpoint(&self) -> Endpoint {
        Endpoint {
            dir: self.source.dir.path().to_string_lossy().into_owned(),
            host: "127.0.0.1".into(),
            port: self.source.port,
        }
    }

    fn target_endpoint(&self) -> Endpoint {
        Endpoint {
            dir: self.target.dir.path().to_string_lossy().into_owned(),
            host: "127.0.0.1".into(),
            port: self.target.port,
        }
    }

    /// Mirrors `dispatcher::add`'s duplicate check: returns `false` without
    /// enqueueing anything if the source directory is already registered.
    pub fn add_pair(&self) -> bool {
        let source = self.source_endpoint();
        if self.state.registry.contains(&source.dir) {
            return false;
        }
        let pair = Pair::new(source, self.target_endpoint());
        self.state.registry.insert(pair.clone());
        dispatcher::enumerate_and_enqueue(&pair, &self.state.queue).unwrap();
        true
    }

    pub fn source_path(&self) -> PathBuf {
        self.source.dir.path().to_path_buf()
    }

    pub fn target_path(&self) -> PathBuf {
        self.target.dir.path().to_path_buf()
    }

    pub fn wait_for_file(&self, filename: &str, expected: &[u8], timeout: Duration) {
        let path = self.target_path().join(filename);
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(contents) = std::fs::read(&path) {
                if contents == expected {
                    return;
                }
            }
            if Instant::now() >= deadline {
                panic!("{filename} never appeared in target with expected contents within {timeout:?}");
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    /// Waits for every in-flight and queued task to finish, the same
    /// sequence the console `shutdown` command runs.
    pub fn shutdown(mut self) {
        self.state.queue.progress().wait_all_done();
        self.state.queue.begin_shutdown();
        if let Some(pool) = self.pool.take() {
            pool.join();
        }
    }
}
