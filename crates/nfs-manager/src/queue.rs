use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

/// One file-transfer unit: a single filename to PULL from a source host and
/// PUSH to a target host.
#[derive(Debug, Clone)]
pub struct Task {
    pub source_dir: String,
    pub source_host: String,
    pub source_port: u16,
    pub target_dir: String,
    pub target_host: String,
    pub target_port: u16,
    pub filename: String,
}

struct Buffer {
    items: VecDeque<Task>,
    capacity: usize,
}

/// Bounded task queue with two condition variables: `not_full`, woken by
/// consumers after a dequeue, and `not_empty`, woken by producers after an
/// enqueue. Splitting them keeps a burst of enqueues from waking every idle
/// worker just to have most of them find the queue already drained.
pub struct Queue {
    buffer: Mutex<Buffer>,
    not_full: Condvar,
    not_empty: Condvar,
    shutting_down: AtomicBool,
    progress: Progress,
}

impl Queue {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(Buffer {
                items: VecDeque::with_capacity(capacity),
                capacity,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            shutting_down: AtomicBool::new(false),
            progress: Progress::new(),
        }
    }

    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Block while the queue is full, then enqueue `task` and count it
    /// toward the total a shutdown waits to see completed.
    pub fn enqueue(&self, task: Task) {
        let mut buffer = self.buffer.lock();
        while buffer.items.len() >= buffer.capacity {
            self.not_full.wait(&mut buffer);
        }
        buffer.items.push_back(task);
        self.progress.increment_total();
        self.not_empty.notify_one();
    }

    /// Block while the queue is empty, unless shutdown has begun — an empty
    /// queue then returns `None`, the sentinel a worker treats as exit.
    pub fn dequeue(&self) -> Option<Task> {
        let mut buffer = self.buffer.lock();
        loop {
            if let Some(task) = buffer.items.pop_front() {
                self.not_full.notify_one();
                return Some(task);
            }
            if self.shutting_down.load(Ordering::Acquire) {
                return None;
            }
            self.not_empty.wait(&mut buffer);
        }
    }

    /// Enter drain-and-exit mode: every worker blocked on `not_empty` wakes,
    /// observes the flag, and exits once the queue is empty.
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        self.not_empty.notify_all();
    }
}

/// Tracks `total_tasks` enqueued against `completed_tasks` finished, with
/// its own mutex and condition variable so shutdown can wait for the two
/// counts to meet without touching the task buffer's lock.
pub struct Progress {
    state: Mutex<ProgressState>,
    all_done: Condvar,
}

struct ProgressState {
    total: u64,
    completed: u64,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: Mutex::new(ProgressState { total: 0, completed: 0 }),
            all_done: Condvar::new(),
        }
    }

    fn increment_total(&self) {
        self.state.lock().total += 1;
    }

    pub fn complete_one(&self) {
        let mut state = self.state.lock();
        state.completed += 1;
        if state.completed >= state.total {
            self.all_done.notify_all();
        }
    }

    /// Block until `completed_tasks == total_tasks`.
    pub fn wait_all_done(&self) {
        let mut state = self.state.lock();
        while state.completed < state.total {
            self.all_done.wait(&mut state);
        }
    }

    #[must_use]
    pub fn counts(&self) -> (u64, u64) {
        let state = self.state.lock();
        (state.total, state.completed)
    }
}
