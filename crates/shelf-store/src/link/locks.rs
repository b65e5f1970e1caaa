//! Per-repository locks
//!
//! Metadata tools must never run twice at once over the same directory.
//! `RepoLocks` hands out one mutex per repository directory; the registry is
//! owned by whoever needs the serialization, never global.

use camino::{Utf8Path, Utf8PathBuf};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Keyed registry of repository mutexes
#[derive(Debug, Default)]
pub struct RepoLocks {
    locks: DashMap<Utf8PathBuf, Arc<Mutex<()>>>,
}

impl RepoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `dir`, created on first use
    pub fn lock_for(&self, dir: &Utf8Path) -> Arc<Mutex<()>> {
        Arc::clone(&self.locks.entry(dir.to_path_buf()).or_default())
    }

    /// Forget the mutex for `dir` once nobody else holds a handle to it
    pub fn release(&self, dir: &Utf8Path) {
        self.locks.remove_if(dir, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of repositories with a live mutex
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_dir_same_lock() {
        let locks = RepoLocks::new();
        let a = locks.lock_for(Utf8Path::new("/repos/el9"));
        let b = locks.lock_for(Utf8Path::new("/repos/el9"));
        let c = locks.lock_for(Utf8Path::new("/repos/el8"));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_lock_is_exclusive() {
        let locks = RepoLocks::new();
        let lock = locks.lock_for(Utf8Path::new("/repos/el9"));
        let _guard = lock.lock();

        let again = locks.lock_for(Utf8Path::new("/repos/el9"));
        assert!(again.try_lock().is_none());
    }

    #[test]
    fn test_release_drops_unused_lock() {
        let locks = RepoLocks::new();
        let dir = Utf8Path::new("/repos/el9");

        let lock = locks.lock_for(dir);
        drop(lock);
        locks.release(dir);

        assert!(locks.is_empty());
    }

    #[test]
    fn test_release_keeps_lock_while_held() {
        let locks = RepoLocks::new();
        let dir = Utf8Path::new("/repos/el9");

        let waiting = locks.lock_for(dir);
        let finished = locks.lock_for(dir);
        drop(finished);
        locks.release(dir);

        assert_eq!(locks.len(), 1);
        assert!(Arc::ptr_eq(&waiting, &locks.lock_for(dir)));
    }
}
