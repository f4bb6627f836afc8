//! # In-flight task tracker.
//!
//! Maintains the set of tasks that currently hold a permit and are executing,
//! keyed by submission index (names may repeat).
//!
//! ## Rules
//! - An entry is added by the drain step right before the task runs.
//! - The entry is removed by [`AliveGuard`] on drop, so every exit path
//!   (value, error, caught panic) clears it.
//! - `snapshot` is used to name stuck tasks when a close grace expires.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Thread-safe registry of executing tasks.
#[derive(Default)]
pub(crate) struct AliveTracker {
    state: Mutex<BTreeMap<u64, Arc<str>>>,
}

impl AliveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, Arc<str>>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `seq` as executing until the returned guard drops.
    pub fn enter(self: &Arc<Self>, seq: u64, name: Arc<str>) -> AliveGuard {
        self.lock().insert(seq, name);
        AliveGuard {
            tracker: Arc::clone(self),
            seq,
        }
    }

    /// Names of executing tasks, in submission order.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().values().map(|n| n.to_string()).collect()
    }

    /// Number of executing tasks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Removes its task from the tracker when dropped.
pub(crate) struct AliveGuard {
    tracker: Arc<AliveTracker>,
    seq: u64,
}

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.tracker.lock().remove(&self.seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_drop_clears_entry() {
        let alive = Arc::new(AliveTracker::new());
        let a = alive.enter(2, Arc::from("b"));
        let b = alive.enter(1, Arc::from("a"));
        assert_eq!(alive.snapshot(), vec!["a", "b"]);

        drop(b);
        assert_eq!(alive.snapshot(), vec!["b"]);
        drop(a);
        assert_eq!(alive.len(), 0);
    }
}
