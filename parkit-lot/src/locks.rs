use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per vehicle plate.
///
/// Entries are created on first use and removed once nobody holds or waits
/// on them, so the map only grows with the number of plates in flight.
#[derive(Debug, Default)]
pub struct PlateLocks {
    inner: Mutex<HashMap<String, PlateSlot>>,
}

#[derive(Debug, Default)]
struct PlateSlot {
    lock: Arc<AsyncMutex<()>>,
    // Callers between the start of `acquire` and the drop of their guard
    users: usize,
}

/// A caller registered on a plate. Unregisters on drop, including when the
/// wait inside `acquire` is cancelled.
#[derive(Debug)]
struct PlateUser<'a> {
    locks: &'a PlateLocks,
    plate: String,
}

/// Exclusive access to one plate. Released on drop.
#[derive(Debug)]
pub struct PlateGuard<'a> {
    // Declared first: the mutex is released before the caller unregisters
    _guard: OwnedMutexGuard<()>,
    _user: PlateUser<'a>,
}

impl PlateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, plate: &str) -> PlateGuard<'_> {
        let (user, lock) = {
            let mut map = self.map();
            let slot = map.entry(plate.to_string()).or_default();
            slot.users += 1;
            (
                PlateUser {
                    locks: self,
                    plate: plate.to_string(),
                },
                slot.lock.clone(),
            )
        };

        let guard = lock.lock_owned().await;

        PlateGuard {
            _guard: guard,
            _user: user,
        }
    }

    /// Number of plates currently tracked.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, PlateSlot>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for PlateUser<'_> {
    fn drop(&mut self) {
        let mut map = self.locks.map();
        if let Some(slot) = map.get_mut(&self.plate) {
            slot.users -= 1;
            if slot.users == 0 {
                map.remove(&self.plate);
            }
        }
    }
}
