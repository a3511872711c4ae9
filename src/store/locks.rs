use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One mutex per area id, created on first use.
///
/// Guards the read-modify-write of a progress record; updates to different
/// areas never contend.
#[derive(Debug, Default)]
pub struct AreaLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AreaLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `area_id`'s mutex. Lock it with [`AreaLocks::acquire`].
    #[must_use]
    pub fn handle(&self, area_id: &str) -> Arc<Mutex<()>> {
        // Clone out of the shard before locking so the map is not held.
        self.locks
            .entry(area_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// The mutex guards no data, so a poisoned lock is still usable.
    pub fn acquire(handle: &Mutex<()>) -> MutexGuard<'_, ()> {
        handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_area_shares_a_mutex() {
        let locks = AreaLocks::new();
        let a = locks.handle("plataforma");
        let b = locks.handle("plataforma");
        let c = locks.handle("mezanino");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn held_lock_blocks_same_area_only() {
        let locks = AreaLocks::new();
        let a = locks.handle("plataforma");
        let _guard = AreaLocks::acquire(&a);

        assert!(locks.handle("plataforma").try_lock().is_err());
        assert!(locks.handle("mezanino").try_lock().is_ok());
    }
}
