//! Delayed one-shot actions, at most one per user
//!
//! Every arm gets a fresh [`TimerToken`]. A callback that wakes up must
//! check its token with [`TimerRegistry::is_current`] (and claim it with
//! [`TimerRegistry::release`]) before doing anything visible, because the
//! timer may have been cancelled or replaced while it was waiting for the
//! caller's per-user lock.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Identifies one arming of a user's timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

struct PendingTimer {
    token: TimerToken,
    handle: JoinHandle<()>,
}

/// Registry of pending per-user timers
#[derive(Default)]
pub struct TimerRegistry {
    pending: Mutex<HashMap<String, PendingTimer>>,
    next_token: AtomicU64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingTimer>> {
        // Only plain map operations happen under this lock
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arm a timer for `user_id`, replacing any pending one.
    ///
    /// `callback` runs once on the tokio runtime after `delay` unless the
    /// timer is cancelled or replaced first. Must be called from within a
    /// runtime.
    pub fn schedule<F, Fut>(&self, user_id: &str, delay: Duration, callback: F) -> TimerToken
    where
        F: FnOnce(TimerToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = TimerToken(self.next_token.fetch_add(1, Ordering::SeqCst) + 1);

        // Spawn while holding the map lock so a zero-delay callback cannot
        // look itself up before it is registered.
        let mut pending = self.lock();
        if let Some(previous) = pending.remove(user_id) {
            previous.handle.abort();
            debug!(user_id, token = previous.token.0, "replaced pending timer");
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(token).await;
        });
        pending.insert(user_id.to_string(), PendingTimer { token, handle });
        debug!(user_id, token = token.0, delay_secs = delay.as_secs(), "armed timer");

        token
    }

    /// Stop the pending timer for `user_id`. Returns false if none was pending.
    pub fn cancel(&self, user_id: &str) -> bool {
        match self.lock().remove(user_id) {
            Some(timer) => {
                timer.handle.abort();
                debug!(user_id, token = timer.token.0, "cancelled timer");
                true
            }
            None => false,
        }
    }

    /// Whether `token` is still the registered timer for `user_id`
    pub fn is_current(&self, user_id: &str, token: TimerToken) -> bool {
        self.lock()
            .get(user_id)
            .is_some_and(|timer| timer.token == token)
    }

    /// Drop the registration for `token` once its callback has fired.
    /// Does nothing (and returns false) if the timer was replaced.
    pub fn release(&self, user_id: &str, token: TimerToken) -> bool {
        let mut pending = self.lock();
        if pending.get(user_id).is_some_and(|timer| timer.token == token) {
            pending.remove(user_id);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self, user_id: &str) -> bool {
        self.lock().contains_key(user_id)
    }

    /// Number of users with a pending timer
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Abort every pending timer
    pub fn cancel_all(&self) {
        for (user_id, timer) in self.lock().drain() {
            timer.handle.abort();
            debug!(user_id = %user_id, "cancelled timer on shutdown");
        }
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
