//! Per-user write serialization
//!
//! The load tracker and the breakthrough detector both read a user's state,
//! compute, then write it back. Holding the user's lock across that sequence
//! keeps two workouts for the same user from losing each other's update.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct UserLocks {
  inner: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl UserLocks {
  pub fn new() -> Self {
    Self::default()
  }

  /// Wait for exclusive access to `user_id`'s state. Other users are not
  /// blocked.
  ///
  /// Entries that no guard or waiter references are dropped on the way, so
  /// the table only holds users with work in flight.
  pub async fn lock(&self, user_id: i64) -> OwnedMutexGuard<()> {
    let user_lock = {
      let mut locks = self.inner.lock().await;
      locks.retain(|id, lock| *id == user_id || Arc::strong_count(lock) > 1);
      locks.entry(user_id).or_default().clone()
    };
    user_lock.lock_owned().await
  }

  #[cfg(test)]
  async fn tracked_users(&self) -> usize {
    self.inner.lock().await.len()
  }
}
