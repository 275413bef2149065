use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A lock used to prevent tests that mutate process-global state (the
/// ObjectId counter) from interleaving with tests that observe it.
pub struct TestLock {
    lock: RwLock<()>,
}

impl TestLock {
    pub fn new() -> Self {
        TestLock {
            lock: RwLock::new(()),
        }
    }

    // Any number of tests can run concurrently while holding this guard.
    pub fn run_concurrently(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap()
    }

    // Only one test can run while holding this guard.
    pub fn run_exclusively(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap()
    }
}
