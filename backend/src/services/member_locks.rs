use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-member async locks used to serialize streak recalculations
///
/// Two activity logs for the same member racing each other would otherwise
/// let the older write-back overwrite the newer one.
#[derive(Default)]
pub struct MemberLocks {
    /// Maps member ids to the lock guarding their derived streak fields
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl MemberLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a member's streak fields
    pub async fn lock(&self, member_id: &Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

            // Drop entries nobody holds or waits on
            locks.retain(|id, lock| id == member_id || Arc::strong_count(lock) > 1);

            locks.entry(*member_id).or_default().clone()
        };

        lock.lock_owned().await
    }

    /// Number of members currently tracked
    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
