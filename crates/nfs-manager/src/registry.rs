use std::collections::HashMap;
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::config::Endpoint;

/// A configured mirror pair: one directory on a source host mirrored to a
/// directory on a target host.
#[derive(Debug, Clone)]
pub struct Pair {
    pub source_dir: String,
    pub source_host: String,
    pub source_port: u16,
    pub target_dir: String,
    pub target_host: String,
    pub target_port: u16,
    pub active: bool,
    pub last_sync_time: Option<SystemTime>,
    pub error_count: u32,
}

impl Pair {
    #[must_use]
    pub fn new(source: Endpoint, target: Endpoint) -> Self {
        Self {
            source_dir: source.dir,
            source_host: source.host,
            source_port: source.port,
            target_dir: target.dir,
            target_host: target.host,
            target_port: target.port,
            active: true,
            last_sync_time: None,
            error_count: 0,
        }
    }
}

/// Configured pairs keyed by source directory, shared between the console
/// command dispatcher and the worker pool's per-task activity check. Plain
/// mutual exclusion is enough here: lookups and updates are single-field
/// and never held across I/O.
#[derive(Default)]
pub struct Registry {
    pairs: Mutex<HashMap<String, Pair>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` without modifying the registry if `source_dir` is
    /// already registered.
    pub fn insert(&self, pair: Pair) -> bool {
        let mut pairs = self.pairs.lock();
        if pairs.contains_key(&pair.source_dir) {
            return false;
        }
        pairs.insert(pair.source_dir.clone(), pair);
        true
    }

    #[must_use]
    pub fn contains(&self, source_dir: &str) -> bool {
        self.pairs.lock().contains_key(source_dir)
    }

    #[must_use]
    pub fn is_active(&self, source_dir: &str) -> bool {
        self.pairs.lock().get(source_dir).is_some_and(|p| p.active)
    }

    /// Returns `false` if `source_dir` isn't registered at all.
    pub fn mark_inactive(&self, source_dir: &str) -> bool {
        let mut pairs = self.pairs.lock();
        let Some(pair) = pairs.get_mut(source_dir) else {
            return false;
        };
        pair.active = false;
        true
    }

    pub fn update_after_worker(&self, source_dir: &str, success: bool) {
        let mut pairs = self.pairs.lock();
        if let Some(pair) = pairs.get_mut(source_dir) {
            pair.last_sync_time = Some(SystemTime::now());
            if !success {
                pair.error_count += 1;
            }
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Pair> {
        self.pairs.lock().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(dir: &str) -> Endpoint {
        Endpoint { dir: dir.to_string(), host: "h".to_string(), port: 1 }
    }

    #[test]
    fn insert_rejects_duplicate_source() {
        let registry = Registry::new();
        assert!(registry.insert(Pair::new(endpoint("/a"), endpoint("/b"))));
        assert!(!registry.insert(Pair::new(endpoint("/a"), endpoint("/c"))));
    }

    #[test]
    fn mark_inactive_then_is_active_reflects_cancellation() {
        let registry = Registry::new();
        registry.insert(Pair::new(endpoint("/a"), endpoint("/b")));
        assert!(registry.is_active("/a"));
        assert!(registry.mark_inactive("/a"));
        assert!(!registry.is_active("/a"));
    }

    #[test]
    fn mark_inactive_on_unknown_source_returns_false() {
        let registry = Registry::new();
        assert!(!registry.mark_inactive("/missing"));
    }
}
