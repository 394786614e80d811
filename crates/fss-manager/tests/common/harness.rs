//! Drives a real [`fss_manager::Supervisor`] end-to-end: a live `notify`
//! watcher on temporary directories, real `fss-worker` child processes, and
//! the admin command/response channel, all without going through the
//! `fss_in`/`fss_out` named pipes `main.rs` sets up for the compiled binary.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use fss_manager::supervisor::{Supervisor, SupervisorMsg};
use fss_manager::watch;
use tempfile::TempDir;

pub struct Harness {
    pub source_dir: TempDir,
    pub target_dir: TempDir,
    _work_dir: TempDir,
    tx: mpsc::Sender<SupervisorMsg>,
    out_path: PathBuf,
    supervisor_thread: Option<thread::JoinHandle<()>>,
}

impl Harness {
    pub fn start(worker_limit: usize) -> Self {
        let source_dir = TempDir::new().expect("create source tempdir");
        let target_dir = TempDir::new().expect("create target tempdir");
        let work_dir = TempDir::new().expect("create work tempdir");

        let logfile = work_dir.path().join("fss.log");
        let out_path = work_dir.path().join("fss_out");
        File::create(&out_path).expect("create fss_out stand-in file");

        let logger = sync_common::Logger::open(&logfile).expect("open domain logger");
        let fss_out = OpenOptions::new()
            .write(true)
            .open(&out_path)
            .expect("open fss_out for writing");

        let (tx, rx) = mpsc::channel::<SupervisorMsg>();
        let watcher = watch::spawn_watcher(tx.clone()).expect("start filesystem watcher");
        let worker_bin = PathBuf::from(env!("CARGO_BIN_EXE_fss-worker"));

        let supervisor = Supervisor::new(worker_limit, logger, fss_out, watcher, worker_bin, tx.clone());
        let supervisor_thread = thread::spawn(move || supervisor.run(rx));

        Self {
            source_dir,
            target_dir,
            _work_dir: work_dir,
            tx,
            out_path,
            supervisor_thread: Some(supervisor_thread),
        }
    }

    pub fn send(&self, line: &str) {
        self.tx
            .send(SupervisorMsg::Command(line.to_string()))
            .expect("supervisor channel closed");
    }

    pub fn source_path(&self) -> String {
        self.source_dir.path().to_string_lossy().into_owned()
    }

    pub fn target_path(&self) -> String {
        self.target_dir.path().to_string_lossy().into_owned()
    }

    /// Poll the admin response log until `needle` shows up, or panic after
    /// `timeout`. There's no event to block on here: the response is just
    /// appended bytes in a file the supervisor writes and flushes to.
    pub fn wait_for_output(&self, needle: &str, timeout: Duration) -> String {
        let deadline = Instant::now() + timeout;
        loop {
            let contents = fs::read_to_string(&self.out_path).unwrap_or_default();
            if contents.contains(needle) {
                return contents;
            }
            if Instant::now() >= deadline {
                panic!("timed out waiting for {needle:?} in admin output, got: {contents:?}");
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    /// Poll the target path until it exists with the expected contents.
    pub fn wait_for_file(&self, relative: &str, expected: &[u8], timeout: Duration) {
        let path = self.target_dir.path().join(relative);
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(contents) = fs::read(&path) {
                if contents == expected {
                    return;
                }
            }
            if Instant::now() >= deadline {
                panic!("timed out waiting for {path:?} to contain {expected:?}");
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    pub fn assert_file_absent_after_settle(&self, relative: &str, settle: Duration) {
        thread::sleep(settle);
        assert!(
            !self.target_dir.path().join(relative).exists(),
            "expected {relative} to remain unmirrored"
        );
    }

    pub fn shutdown(mut self) {
        self.send("shutdown");
        if let Some(handle) = self.supervisor_thread.take() {
            let _ = handle.join();
        }
    }
}
