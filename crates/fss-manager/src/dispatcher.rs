use sync_common::{format_system_time, now_string};

use crate::registry::Pair;
use crate::supervisor::Supervisor;
use crate::watch;

/// Parse and execute one administrative command line. Responses are
/// written directly to `fss_out`; this never blocks on anything but that
/// write, since it runs inside the supervisor's single consumer loop.
pub fn dispatch(sup: &mut Supervisor, line: &str) {
    let mut tokens = line.split_whitespace();
    let Some(cmd) = tokens.next() else {
        sup.respond(&format!("[{}] Invalid command format\n", now_string()));
        return;
    };

    match cmd {
        "add" => {
            let (Some(source), Some(target)) = (tokens.next(), tokens.next()) else {
                sup.respond(&format!("[{}] Invalid command format\n", now_string()));
                return;
            };
            add(sup, source, target);
        }
        "cancel" => {
            let Some(source) = tokens.next() else {
                sup.respond(&format!("[{}] Invalid command format\n", now_string()));
                return;
            };
            cancel(sup, source);
        }
        "status" => {
            let Some(source) = tokens.next() else {
                sup.respond(&format!("[{}] Invalid command format\n", now_string()));
                return;
            };
            status(sup, source);
        }
        "sync" => {
            let Some(source) = tokens.next() else {
                sup.respond(&format!("[{}] Invalid command format\n", now_string()));
                return;
            };
            sync(sup, source);
        }
        "shutdown" => shutdown(sup),
        other => {
            sup.respond(&format!("[{}] Unknown command: {other}\n", now_string()));
        }
    }
}

fn add(sup: &mut Supervisor, source: &str, target: &str) {
    let ts = now_string();
    if sup.shutting_down {
        sup.respond(&format!("[{ts}] Shutdown in progress, cannot add: {source}\n"));
        return;
    }
    if sup.registry.find(source).is_some() {
        sup.respond(&format!("[{ts}] Already in queue: {source}\n"));
        return;
    }

    let mut pair = Pair::new(source, target);
    match watch::watch_dir(&mut sup.watcher, source) {
        Ok(()) => {
            pair.watching = true;
            sup.registry.insert(pair);
            sup.log_message(&format!("Added directory: {source} -> {target}"));
            sup.log_message(&format!("Monitoring started for {source}"));
            sup.respond(&format!(
                "[{ts}] Added directory: {source} -> {target}\n[{ts}] Monitoring started for {source}\n"
            ));
        }
        Err(_) => {
            sup.registry.insert(pair);
            sup.log_message(&format!("Failed to monitor {source}"));
            sup.respond(&format!("[{ts}] Failed to monitor {source}\n"));
        }
    }
    sup.schedule(source, target, "ALL", "FULL");
}

fn cancel(sup: &mut Supervisor, source: &str) {
    let ts = now_string();
    let Some(pair) = sup.registry.find(source) else {
        sup.respond(&format!("[{ts}] Directory not monitored: {source}\n"));
        return;
    };

    if !pair.active {
        sup.respond(&format!("[{ts}] Directory not monitored: {source}\n"));
        return;
    }

    watch::unwatch_dir(&mut sup.watcher, source);
    sup.registry.mark_inactive(source);
    sup.log_message(&format!("Monitoring stopped for {source}"));
    sup.respond(&format!("[{ts}] Monitoring stopped for {source}\n"));
}

fn status(sup: &mut Supervisor, source: &str) {
    let ts = now_string();
    sup.log_message(&format!("Status requested for {source}"));

    let Some(pair) = sup.registry.find(source) else {
        sup.respond(&format!("[{ts}] Directory not monitored: {source}\n"));
        return;
    };

    let last_sync = pair
        .last_sync_time
        .map(format_system_time)
        .unwrap_or_else(|| "never".to_string());

    sup.respond(&format!(
        "[{ts}] Status requested for {source}\nDirectory: {}\nTarget: {}\nLast Sync: {last_sync}\nErrors: {}\nStatus: {}\n",
        pair.source_path,
        pair.target_path,
        pair.error_count,
        if pair.active { "Active" } else { "Inactive" },
    ));
}

fn sync(sup: &mut Supervisor, source: &str) {
    let ts = now_string();
    let Some(pair) = sup.registry.find(source) else {
        sup.respond(&format!("[{ts}] Directory not monitored: {source}\n"));
        return;
    };

    // Open question (a) in the design notes: `sync` is accepted only when
    // the pair is currently inactive; a full re-sync while active is
    // rejected rather than attempted concurrently with the live watch.
    if pair.active {
        sup.respond(&format!("[{ts}] Sync already in progress: {source}\n"));
        return;
    }

    let target = pair.target_path.clone();
    let error_count = pair.error_count;
    sup.log_message(&format!("Syncing directory: {source} -> {target}"));

    if let Some(p) = sup.registry.find_mut(source) {
        p.active = true;
    }
    if watch::watch_dir(&mut sup.watcher, source).is_ok() {
        if let Some(p) = sup.registry.find_mut(source) {
            p.watching = true;
        }
    }
    sup.schedule(source, &target, "ALL", "FULL");

    sup.respond(&format!(
        "[{ts}] Syncing directory: {source} -> {target}\n[{ts}] Sync completed {source} -> {target} Errors:{error_count}\n"
    ));
}

fn shutdown(sup: &mut Supervisor) {
    let ts = now_string();
    sup.log_message("Shutting down manager");
    sup.respond(&format!(
        "[{ts}] Shutting down manager...\n[{ts}] Waiting for active workers to finish...\n[{ts}] Processing remaining tasks...\n"
    ));
    sup.shutting_down = true;
}
