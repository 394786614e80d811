use std::path::Path;
use std::sync::mpsc::Sender;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::supervisor::SupervisorMsg;

/// Start the filesystem watcher. Its internal thread (owned by `notify`,
/// not by us) is a pure producer: it only ever sends immutable
/// `FsEvent` messages into the supervisor's channel, never touching
/// shared state directly.
pub fn spawn_watcher(tx: Sender<SupervisorMsg>) -> notify::Result<RecommendedWatcher> {
    notify::recommended_watcher(move |res: notify::Result<Event>| {
        let Ok(event) = res else { return };
        let Some(operation) = classify(&event.kind) else {
            return;
        };
        for path in &event.paths {
            let Some(dir) = path.parent() else { continue };
            let Some(filename) = path.file_name() else {
                continue;
            };
            let _ = tx.send(SupervisorMsg::FsEvent {
                dir: dir.to_string_lossy().into_owned(),
                filename: filename.to_string_lossy().into_owned(),
                operation,
            });
        }
    })
}

fn classify(kind: &EventKind) -> Option<&'static str> {
    match kind {
        EventKind::Create(_) => Some("ADDED"),
        EventKind::Modify(_) => Some("MODIFIED"),
        EventKind::Remove(_) => Some("DELETED"),
        _ => None,
    }
}

pub fn watch_dir(watcher: &mut RecommendedWatcher, dir: &str) -> notify::Result<()> {
    watcher.watch(Path::new(dir), RecursiveMode::NonRecursive)
}

pub fn unwatch_dir(watcher: &mut RecommendedWatcher, dir: &str) {
    let _ = watcher.unwatch(Path::new(dir));
}
