//! Handle cache (`SPEC_FULL.md` §10, grounded on the original project's
//! `client/fdmap.c`): a small bounded map from relative wire path to the
//! most recently opened handle for that path, populated by `CREATE` and
//! consulted opportunistically by later operations on the same path.
//!
//! A cache miss is never an error — every caller still has a correct
//! path-based fallback — so this exists purely to avoid re-opening a path
//! that was just opened a moment ago.

use std::{collections::VecDeque, fs::File};

/// Default number of handles kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 64;

/// Bounded LRU-ish cache from relative path to an open file handle.
pub struct HandleCache {
    capacity: usize,
    order: VecDeque<String>,
    handles: std::collections::HashMap<String, File>,
}

impl HandleCache {
    /// Build a cache with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, order: VecDeque::new(), handles: std::collections::HashMap::new() }
    }

    /// Insert (or replace) the handle for `path`, evicting the
    /// least-recently-inserted entry if over capacity.
    pub fn insert(&mut self, path: String, file: File) {
        if !self.handles.contains_key(&path) {
            self.order.push_back(path.clone());
        }
        self.handles.insert(path, file);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.handles.remove(&oldest);
            }
        }
    }

    /// Look up the cached handle for `path`, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&File> {
        self.handles.get(path)
    }

    /// Evict the entry for `path`, e.g. after `UNLINK`/`RMDIR`/`RENAME`.
    pub fn evict(&mut self, path: &str) {
        self.handles.remove(path);
        self.order.retain(|p| p != path);
    }
}

impl Default for HandleCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn evicts_oldest_past_capacity() {
        let dir = tempdir().unwrap();
        let mut cache = HandleCache::new(2);
        for i in 0..3 {
            let path = dir.path().join(format!("f{i}"));
            let file = std::fs::File::create(&path).unwrap();
            cache.insert(format!("f{i}"), file);
        }
        assert!(cache.get("f0").is_none());
        assert!(cache.get("f1").is_some());
        assert!(cache.get("f2").is_some());
    }

    #[test]
    fn evict_removes_entry() {
        let dir = tempdir().unwrap();
        let mut cache = HandleCache::new(4);
        let path = dir.path().join("f");
        cache.insert("f".into(), std::fs::File::create(&path).unwrap());
        assert!(cache.get("f").is_some());
        cache.evict("f");
        assert!(cache.get("f").is_none());
    }

    #[test]
    fn cached_handle_is_usable() {
        let dir = tempdir().unwrap();
        let mut cache = HandleCache::new(4);
        let path = dir.path().join("f");
        let file = std::fs::OpenOptions::new().create(true).write(true).open(&path).unwrap();
        cache.insert("f".into(), file);
        let mut handle = cache.get("f").unwrap();
        handle.write_all(b"hi").unwrap();
    }
}
