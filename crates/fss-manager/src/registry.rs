use std::collections::HashMap;
use std::collections::hash_map::Values;
use std::time::SystemTime;

/// A configured source→target mapping. Owned exclusively by the
/// supervisor; workers receive plain copies of the fields they need.
#[derive(Debug, Clone)]
pub struct Pair {
    pub source_path: String,
    pub target_path: String,
    pub active: bool,
    pub last_sync_time: Option<SystemTime>,
    pub error_count: u32,
    pub last_worker_id: Option<u32>,
    pub last_operation: Option<String>,
    /// Whether the filesystem watcher currently has a watch registered for
    /// `source_path`. Stands in for inotify's `wd` handle: `notify` doesn't
    /// expose a watch-descriptor id, just a watched path.
    pub watching: bool,
}

impl Pair {
    #[must_use]
    pub fn new(source_path: impl Into<String>, target_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
            active: true,
            last_sync_time: None,
            error_count: 0,
            last_worker_id: None,
            last_operation: None,
            watching: false,
        }
    }
}

/// In-memory set of monitored pairs (C1), keyed by `source_path`.
#[derive(Debug, Default)]
pub struct Registry {
    pairs: HashMap<String, Pair>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new pair. Returns `false` without modifying the registry
    /// if `source_path` is already registered.
    pub fn insert(&mut self, pair: Pair) -> bool {
        if self.pairs.contains_key(&pair.source_path) {
            return false;
        }
        self.pairs.insert(pair.source_path.clone(), pair);
        true
    }

    #[must_use]
    pub fn find(&self, source_path: &str) -> Option<&Pair> {
        self.pairs.get(source_path)
    }

    pub fn find_mut(&mut self, source_path: &str) -> Option<&mut Pair> {
        self.pairs.get_mut(source_path)
    }

    pub fn mark_inactive(&mut self, source_path: &str) -> bool {
        let Some(pair) = self.pairs.get_mut(source_path) else {
            return false;
        };
        pair.active = false;
        pair.watching = false;
        true
    }

    pub fn update_after_worker(&mut self, source_path: &str, success: bool, worker_id: u32, operation: &str) {
        if let Some(pair) = self.pairs.get_mut(source_path) {
            pair.last_sync_time = Some(SystemTime::now());
            pair.last_worker_id = Some(worker_id);
            pair.last_operation = Some(operation.to_string());
            if !success {
                pair.error_count += 1;
            }
        }
    }

    pub fn remove(&mut self, source_path: &str) -> Option<Pair> {
        self.pairs.remove(source_path)
    }

    pub fn values(&self) -> Values<'_, String, Pair> {
        self.pairs.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_duplicate_source_path() {
        let mut registry = Registry::new();
        assert!(registry.insert(Pair::new("/src", "/tgt")));
        assert!(!registry.insert(Pair::new("/src", "/other")));
        assert_eq!(registry.find("/src").unwrap().target_path, "/tgt");
    }

    #[test]
    fn mark_inactive_clears_watching_flag() {
        let mut registry = Registry::new();
        let mut pair = Pair::new("/src", "/tgt");
        pair.watching = true;
        registry.insert(pair);

        assert!(registry.mark_inactive("/src"));
        let pair = registry.find("/src").unwrap();
        assert!(!pair.active);
        assert!(!pair.watching);
    }

    #[test]
    fn update_after_worker_increments_error_count_on_failure() {
        let mut registry = Registry::new();
        registry.insert(Pair::new("/src", "/tgt"));

        registry.update_after_worker("/src", false, 42, "ADDED");
        assert_eq!(registry.find("/src").unwrap().error_count, 1);

        registry.update_after_worker("/src", true, 43, "ADDED");
        assert_eq!(registry.find("/src").unwrap().error_count, 1);
    }
}
